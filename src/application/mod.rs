//! Application layer: operations over the domain ports.
//!
//! - [`services::shipment_registry::ShipmentRegistry`] - Shipment create, lookup, status updates, delete, list
//! - [`services::auth_service::AuthService`] - Admin API token authentication
//! - [`tracker`] - Status polling and change notification

pub mod services;
pub mod tracker;
