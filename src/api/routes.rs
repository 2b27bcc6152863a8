//! API route configuration.
//!
//! Tracking a shipment is public; everything that lists or changes shipments
//! requires Bearer token authentication via [`crate::api::middleware::auth`].
//! Both routers are nested under `/api` and share the
//! `/shipments/{tracking}` path, which axum merges by method.

use crate::api::handlers::{
    advance_shipment_handler, create_shipment_handler, delete_shipment_handler,
    get_shipment_handler, list_shipments_handler, set_status_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Public routes.
///
/// # Endpoints
///
/// - `GET    /shipments/{tracking}`         - Shipment with history
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/shipments/{tracking}", get(get_shipment_handler))
}

/// Admin routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET    /shipments`                    - List, filtered by `q` and `status`
/// - `POST   /shipments`                    - Create a shipment
/// - `POST   /shipments/{tracking}/advance` - Move to the next status
/// - `PUT    /shipments/{tracking}/status`  - Set a status directly
/// - `DELETE /shipments/{tracking}`         - Delete a shipment
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shipments",
            get(list_shipments_handler).post(create_shipment_handler),
        )
        .route("/shipments/{tracking}", delete(delete_shipment_handler))
        .route(
            "/shipments/{tracking}/advance",
            post(advance_shipment_handler),
        )
        .route("/shipments/{tracking}/status", put(set_status_handler))
}
