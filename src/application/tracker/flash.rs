//! Single-slot notification sink with expiry.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::entities::Notification;
use crate::domain::repositories::NotificationSink;

/// How long a notification stays visible.
pub const DEFAULT_FLASH_TTL: Duration = Duration::from_millis(3500);

/// A notification together with the moment it was raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub notification: Notification,
    pub raised_at: Instant,
}

impl Flash {
    pub fn expires_at(&self, ttl: Duration) -> Instant {
        self.raised_at + ttl
    }
}

/// Holds the latest notification until it expires or is replaced.
///
/// Readers either poll [`FlashSink::current`] or [`FlashSink::subscribe`] to
/// be woken on every replacement.
#[derive(Debug)]
pub struct FlashSink {
    slot: watch::Sender<Option<Flash>>,
    ttl: Duration,
}

impl FlashSink {
    pub fn new(ttl: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the current notification unless it has expired.
    pub fn current(&self) -> Option<Notification> {
        self.slot
            .borrow()
            .as_ref()
            .filter(|flash| Instant::now() < flash.expires_at(self.ttl))
            .map(|flash| flash.notification.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Flash>> {
        self.slot.subscribe()
    }
}

impl Default for FlashSink {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_TTL)
    }
}

impl NotificationSink for FlashSink {
    fn notify(&self, notification: Notification) {
        self.slot.send_replace(Some(Flash {
            notification,
            raised_at: Instant::now(),
        }));
    }

    fn clear(&self) {
        self.slot.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_flash_expires_after_ttl() {
        let sink = FlashSink::default();
        sink.notify(Notification::success("Shipment status updated: Delivered"));

        tokio::time::advance(Duration::from_millis(3000)).await;
        assert_eq!(
            sink.current().map(|n| n.message),
            Some("Shipment status updated: Delivered".to_string())
        );

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(sink.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notification_replaces_old() {
        let sink = FlashSink::new(Duration::from_secs(1));
        sink.notify(Notification::success("first"));
        tokio::time::advance(Duration::from_millis(900)).await;

        sink.notify(Notification::error("second"));
        tokio::time::advance(Duration::from_millis(900)).await;

        let current = sink.current().unwrap();
        assert_eq!(current.message, "second");
    }

    #[tokio::test]
    async fn test_clear_and_subscribe() {
        let sink = FlashSink::default();
        let mut rx = sink.subscribe();

        sink.notify(Notification::success("hello"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());

        sink.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
        assert!(sink.current().is_none());
    }
}
