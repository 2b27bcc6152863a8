//! # Shipment Tracker
//!
//! A shipment registry and status tracking service built with Axum.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Shipment entities and port traits
//! - **Application Layer** ([`application`]) - The shipment registry and the status tracker
//! - **Infrastructure Layer** ([`infrastructure`]) - Store backends and the REST client
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Tracking code generation with collision retry
//! - Ordered status lifecycle with append-only history
//! - Whole-collection persistence to a JSON file, Redis or memory
//! - Polling status tracker with expiring notifications
//! - API token authentication, rate limiting and request tracing
//! - `shipctl` operator CLI
//!
//! ## Quick Start
//!
//! ```bash
//! export API_TOKEN="change-me"
//! export TOKEN_SIGNING_SECRET="also-change-me"
//! export STORE_PATH="./shipments.json"
//!
//! cargo run
//!
//! shipctl --token change-me create
//! shipctl track SHP-LX2K9A1B-4821
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AuthService, ShipmentRegistry};
    pub use crate::application::tracker::{FlashSink, PollingSession, StatusTracker, TrackerState};
    pub use crate::domain::entities::{NewShipment, Shipment, ShipmentFilter, ShipmentStatus};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
