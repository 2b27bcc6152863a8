//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod shipments;

pub use health::health_handler;
pub use shipments::{
    advance_shipment_handler, create_shipment_handler, delete_shipment_handler,
    get_shipment_handler, list_shipments_handler, set_status_handler,
};
