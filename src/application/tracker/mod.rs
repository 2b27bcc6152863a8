//! Status tracking: watch one shipment and report status changes.
//!
//! - [`StatusTracker`] - the poll state machine, one fetch per tick
//! - [`PollingSession`] - drives a tracker on a tokio interval
//! - [`FlashSink`] - notification slot that expires after a TTL

pub mod flash;
pub mod session;
pub mod status_tracker;

pub use flash::{DEFAULT_FLASH_TTL, Flash, FlashSink};
pub use session::{DEFAULT_POLL_INTERVAL, PollingSession};
pub use status_tracker::{POLL_ERROR_MESSAGE, StatusTracker, TickOutcome, TrackerState};
