#![allow(dead_code)]

use axum::{Router, middleware, routing::get};
use axum_test::TestServer;
use serde_json::{Value, json};
use shipment_tracker::api;
use shipment_tracker::api::handlers::health_handler;
use shipment_tracker::api::middleware::auth;
use shipment_tracker::application::services::{AuthService, ShipmentRegistry};
use shipment_tracker::domain::repositories::ShipmentStore;
use shipment_tracker::infrastructure::persistence::MemoryShipmentStore;
use shipment_tracker::state::AppState;
use std::sync::Arc;

pub const TEST_TOKEN: &str = "test-admin-token";
pub const TEST_SIGNING_SECRET: &str = "test-signing-secret";

pub fn create_test_state(store: Arc<dyn ShipmentStore>) -> AppState {
    let registry = ShipmentRegistry::new(store, "SHP", Vec::new());
    let auth_service = AuthService::new(TEST_TOKEN, TEST_SIGNING_SECRET);
    AppState::new(Arc::new(registry), Arc::new(auth_service))
}

/// Full route table with authentication, without rate limiting (the test
/// transport has no peer address).
pub fn make_app(state: AppState) -> Router {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::routes::public_routes().merge(protected))
        .with_state(state)
}

pub fn make_server() -> (TestServer, Arc<MemoryShipmentStore>) {
    let store = Arc::new(MemoryShipmentStore::new());
    let state = create_test_state(store.clone());
    (TestServer::new(make_app(state)).unwrap(), store)
}

pub fn alice_to_bob() -> Value {
    json!({
        "sender": "Alice",
        "recipient": "Bob",
        "origin": "NY",
        "destination": "LA",
        "weight": "5"
    })
}

/// Creates a shipment through the API and returns its tracking code.
pub async fn create_shipment(server: &TestServer, body: Value) -> String {
    let response = server
        .post("/api/shipments")
        .authorization_bearer(TEST_TOKEN)
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    response.json::<Value>()["shipment"]["tracking"]
        .as_str()
        .unwrap()
        .to_string()
}
