//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AuthService, ShipmentRegistry};
use crate::domain::repositories::ShipmentStore;

/// Registry over whichever store backend was configured at startup.
pub type Registry = ShipmentRegistry<dyn ShipmentStore>;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, auth_service: Arc<AuthService>) -> Self {
        Self {
            registry,
            auth_service,
        }
    }
}
