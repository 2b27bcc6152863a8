//! Persistence port for the shipment collection.

use crate::domain::entities::Shipment;
use crate::error::AppError;
use async_trait::async_trait;

/// Key under which the whole collection is stored as one JSON blob.
pub const DEFAULT_STORE_KEY: &str = "shipments:v1";

/// Stores the complete shipment collection as a single value.
///
/// The registry reads the collection once at startup and writes it back in
/// full after every mutation, so implementations never see partial updates.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::FileShipmentStore`] - JSON file
/// - [`crate::infrastructure::persistence::RedisShipmentStore`] - Redis key
/// - [`crate::infrastructure::persistence::MemoryShipmentStore`] - in-process
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Loads the persisted collection, most-recent-first.
    ///
    /// An absent blob is an empty collection, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backend is unreachable or the
    /// stored blob cannot be decoded.
    async fn load(&self) -> Result<Vec<Shipment>, AppError>;

    /// Replaces the persisted collection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the write fails.
    async fn save(&self, shipments: &[Shipment]) -> Result<(), AppError>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
