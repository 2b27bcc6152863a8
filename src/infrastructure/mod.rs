//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`client`] - HTTP client for the shipment REST API
//! - [`persistence`] - Shipment store backends (file, Redis, memory)

pub mod client;
pub mod persistence;
