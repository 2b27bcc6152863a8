//! Source the status tracker polls.

use crate::domain::entities::Shipment;
use crate::error::AppError;
use async_trait::async_trait;

/// Fetches the current state of a shipment by tracking code.
///
/// Implemented by the in-process registry and by the REST client, so the
/// tracker runs unchanged against either.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown tracking code, or any
    /// transport/storage error of the underlying source.
    async fn fetch(&self, tracking: &str) -> Result<Shipment, AppError>;
}
