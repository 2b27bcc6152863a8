//! Helpers shared across layers.
//!
//! - [`tracking_code`] - Tracking code generation
//! - [`weight`] - Lenient weight coercion

pub mod tracking_code;
pub mod weight;
