//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Shipment`] - A shipment record with its status history
//! - [`ShipmentStatus`] - The fixed, ordered delivery lifecycle
//! - [`Notification`] - A transient message raised by the status tracker
//!
//! Creation input lives in [`NewShipment`]; list criteria in [`ShipmentFilter`].

pub mod notification;
pub mod shipment;
pub mod status;

pub use notification::{Notification, Severity};
pub use shipment::{
    HistoryEntry, NewShipment, RESTORED_NOTE, ServiceLevel, Shipment, ShipmentFilter,
};
pub use status::{ParseStatusError, ShipmentStatus};
