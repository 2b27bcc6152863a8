//! In-process shipment store.

use crate::domain::entities::Shipment;
use crate::domain::repositories::ShipmentStore;
use crate::error::AppError;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Keeps the collection in memory only; everything is lost on restart.
///
/// Used for `STORE_BACKEND=memory` and as the store behind integration tests.
#[derive(Default)]
pub struct MemoryShipmentStore {
    shipments: Mutex<Vec<Shipment>>,
}

impl MemoryShipmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shipments(shipments: Vec<Shipment>) -> Self {
        Self {
            shipments: Mutex::new(shipments),
        }
    }

    /// Returns a copy of what was last saved.
    pub async fn snapshot(&self) -> Vec<Shipment> {
        self.shipments.lock().await.clone()
    }
}

#[async_trait]
impl ShipmentStore for MemoryShipmentStore {
    async fn load(&self) -> Result<Vec<Shipment>, AppError> {
        Ok(self.snapshot().await)
    }

    async fn save(&self, shipments: &[Shipment]) -> Result<(), AppError> {
        *self.shipments.lock().await = shipments.to_vec();
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
