//! Sink the status tracker reports to.

use crate::domain::entities::Notification;

/// Receives notifications raised by the status tracker.
///
/// Sinks hold at most one notification: a new one replaces any that has not
/// been acknowledged yet.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);

    /// Drops the current notification, if any.
    fn clear(&self);
}
