//! Business logic services for the application layer.

pub mod auth_service;
pub mod shipment_registry;

pub use auth_service::AuthService;
pub use shipment_registry::{MARK_DELIVERED_NOTE, ShipmentRegistry};
