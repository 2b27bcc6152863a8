//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. They are shared with [`crate::infrastructure::client`].

pub mod health;
pub mod shipment;

pub use health::{CheckStatus, HealthChecks, HealthResponse};
pub use shipment::{
    CreateShipmentRequest, ListShipmentsParams, SetStatusRequest, ShipmentEnvelope,
    ShipmentListResponse,
};
