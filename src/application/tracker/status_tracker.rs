//! Polling state machine.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::entities::{Notification, Shipment, ShipmentStatus};
use crate::domain::repositories::{NotificationSink, StatusSource};
use crate::error::AppError;

/// Message emitted when a poll fails.
pub const POLL_ERROR_MESSAGE: &str = "Error updating status";

/// Where a tracking session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    /// No shipment is being watched.
    Idle,
    /// Watching `tracking`; `last_status` is the most recently observed status.
    Polling {
        tracking: String,
        last_status: ShipmentStatus,
    },
    /// A poll failed. Only a fresh lookup leaves this state.
    Stopped { tracking: String, reason: String },
}

/// Result of a single [`StatusTracker::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tracker was not polling; nothing was fetched.
    Inactive,
    Unchanged(Shipment),
    Changed {
        from: ShipmentStatus,
        shipment: Shipment,
    },
    /// The fetch failed and polling stopped.
    Stopped,
}

/// Detects status changes of one shipment across repeated fetches.
///
/// The tracker itself owns no timer: every call to [`Self::tick`] is one poll.
/// [`super::PollingSession`] drives it on an interval.
pub struct StatusTracker<S, N>
where
    S: StatusSource + ?Sized,
    N: NotificationSink + ?Sized,
{
    source: Arc<S>,
    sink: Arc<N>,
    state: TrackerState,
}

impl<S, N> StatusTracker<S, N>
where
    S: StatusSource + ?Sized,
    N: NotificationSink + ?Sized,
{
    pub fn new(source: Arc<S>, sink: Arc<N>) -> Self {
        Self {
            source,
            sink,
            state: TrackerState::Idle,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Starts watching `tracking`, discarding whatever was watched before.
    ///
    /// Clears the sink, fetches the shipment and on success remembers its
    /// status and enters [`TrackerState::Polling`].
    ///
    /// # Errors
    ///
    /// Returns the source's error (usually [`AppError::NotFound`]); the
    /// tracker is left [`TrackerState::Idle`].
    pub async fn lookup(&mut self, tracking: &str) -> Result<Shipment, AppError> {
        self.sink.clear();
        self.state = TrackerState::Idle;

        let shipment = self.source.fetch(tracking).await?;

        debug!(tracking, status = %shipment.status, "Tracking started");
        self.state = TrackerState::Polling {
            tracking: tracking.to_string(),
            last_status: shipment.status,
        };

        Ok(shipment)
    }

    /// Performs one poll.
    ///
    /// Emits a notification only when the fetched status differs from the
    /// remembered one; a failed fetch emits an error notification and stops.
    pub async fn tick(&mut self) -> TickOutcome {
        let TrackerState::Polling {
            tracking,
            last_status,
        } = &self.state
        else {
            return TickOutcome::Inactive;
        };
        let tracking = tracking.clone();
        let last_status = *last_status;

        match self.source.fetch(&tracking).await {
            Err(e) => {
                warn!(tracking, error = %e, "Status poll failed, stopping");
                self.state = TrackerState::Stopped {
                    tracking,
                    reason: e.to_string(),
                };
                self.sink.notify(Notification::error(POLL_ERROR_MESSAGE));
                TickOutcome::Stopped
            }
            Ok(shipment) if shipment.status != last_status => {
                info!(tracking, from = %last_status, to = %shipment.status, "Status change observed");
                self.state = TrackerState::Polling {
                    tracking,
                    last_status: shipment.status,
                };
                metrics::counter!("tracker_notifications_total").increment(1);
                self.sink.notify(Notification::success(format!(
                    "Shipment status updated: {}",
                    shipment.status
                )));
                TickOutcome::Changed {
                    from: last_status,
                    shipment,
                }
            }
            Ok(shipment) => TickOutcome::Unchanged(shipment),
        }
    }

    /// Leaves [`TrackerState::Polling`] for [`TrackerState::Idle`].
    ///
    /// A stopped tracker stays stopped.
    pub fn stop(&mut self) {
        if matches!(self.state, TrackerState::Polling { .. }) {
            self.state = TrackerState::Idle;
        }
    }
}
