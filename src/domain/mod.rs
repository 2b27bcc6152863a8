//! Domain layer: entities and the ports the rest of the crate plugs into.
//!
//! - [`entities`] - Shipment, status lifecycle, notifications
//! - [`repositories`] - Persistence, status source and notification traits
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business operations live in [`crate::application`].

pub mod entities;
pub mod repositories;
