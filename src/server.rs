//! HTTP server initialization and runtime setup.
//!
//! Opens the configured shipment store, loads the registry from it and runs
//! the Axum server until Ctrl-C.

use crate::application::services::{AuthService, ShipmentRegistry};
use crate::config::{Config, StoreBackend};
use crate::domain::repositories::ShipmentStore;
use crate::infrastructure::persistence::{
    FileShipmentStore, MemoryShipmentStore, RedisShipmentStore,
};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Opens the store backend selected by `config`.
///
/// # Errors
///
/// Returns an error if the Redis backend is selected and Redis stays
/// unreachable after the connection retries.
pub async fn open_store(config: &Config) -> Result<Arc<dyn ShipmentStore>> {
    let store: Arc<dyn ShipmentStore> = match config.store_backend {
        StoreBackend::File => Arc::new(FileShipmentStore::new(&config.store_path)),
        StoreBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("Redis backend selected but no Redis URL configured")?;
            Arc::new(RedisShipmentStore::connect(url, config.store_key.clone()).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; shipments are lost on restart");
            Arc::new(MemoryShipmentStore::new())
        }
    };

    Ok(store)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Shipment store (file, Redis or memory)
/// - Shipment registry, loaded from the store
/// - Token authentication
/// - Axum HTTP server with graceful shutdown on Ctrl-C
///
/// # Errors
///
/// Returns an error if:
/// - The store cannot be opened or read
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = open_store(&config).await?;
    tracing::info!("Store ready ({})", config.store_backend);

    let registry = ShipmentRegistry::load(store, config.tracking_prefix.clone())
        .await
        .context("Failed to load shipments")?;

    let auth_service = AuthService::new(&config.api_token, config.token_signing_secret.clone());

    let state = AppState::new(Arc::new(registry), Arc::new(auth_service));

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
