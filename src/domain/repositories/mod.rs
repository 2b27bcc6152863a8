//! Port traits for the domain layer.
//!
//! The domain depends only on these traits; concrete implementations live in
//! `crate::infrastructure` and mocks are generated with `mockall` for tests.
//!
//! - [`ShipmentStore`] - Whole-collection persistence
//! - [`StatusSource`] - Shipment lookup used by the status tracker
//! - [`NotificationSink`] - Where the status tracker reports changes

pub mod notification_sink;
pub mod shipment_store;
pub mod status_source;

pub use notification_sink::NotificationSink;
pub use shipment_store::{DEFAULT_STORE_KEY, ShipmentStore};
pub use status_source::StatusSource;

#[cfg(test)]
pub use notification_sink::MockNotificationSink;
#[cfg(test)]
pub use shipment_store::MockShipmentStore;
#[cfg(test)]
pub use status_source::MockStatusSource;
