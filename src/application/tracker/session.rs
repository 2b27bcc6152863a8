//! Timer-driven tracking session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use super::status_tracker::{StatusTracker, TickOutcome, TrackerState};
use crate::domain::entities::Shipment;
use crate::domain::repositories::{NotificationSink, StatusSource};
use crate::error::AppError;

/// Default delay between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Runs a [`StatusTracker`] on a background interval.
///
/// At most one poll loop is alive per session: a new [`lookup`](Self::lookup)
/// aborts the previous loop before starting its own, and dropping the session
/// aborts it too.
pub struct PollingSession<S, N>
where
    S: StatusSource + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    source: Arc<S>,
    sink: Arc<N>,
    period: Duration,
    state: Arc<watch::Sender<TrackerState>>,
    task: Option<JoinHandle<()>>,
}

impl<S, N> PollingSession<S, N>
where
    S: StatusSource + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, sink: Arc<N>, period: Duration) -> Self {
        let (state, _) = watch::channel(TrackerState::Idle);
        Self {
            source,
            sink,
            period,
            state: Arc::new(state),
            task: None,
        }
    }

    /// Looks up `tracking` and, on success, starts polling it every period.
    ///
    /// Any previous loop is cancelled and awaited first, so a poll still in
    /// flight cannot notify after the sink has been cleared. The first poll
    /// happens one full period after the lookup.
    ///
    /// # Errors
    ///
    /// Returns the lookup error; no poll loop is running afterwards.
    pub async fn lookup(&mut self, tracking: &str) -> Result<Shipment, AppError> {
        self.cancel_task().await;

        let mut tracker = StatusTracker::new(Arc::clone(&self.source), Arc::clone(&self.sink));
        let result = tracker.lookup(tracking).await;
        self.state.send_replace(tracker.state().clone());
        let shipment = result?;

        let state = Arc::clone(&self.state);
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let outcome = tracker.tick().await;
                state.send_if_modified(|current| {
                    if current == tracker.state() {
                        return false;
                    }
                    *current = tracker.state().clone();
                    true
                });
                if matches!(outcome, TickOutcome::Stopped | TickOutcome::Inactive) {
                    break;
                }
            }
            debug!("Poll loop finished");
        }));

        Ok(shipment)
    }

    /// Cancels polling and waits for the loop to exit. A stopped session keeps
    /// its stopped state.
    pub async fn stop(&mut self) {
        self.cancel_task().await;
        self.state.send_if_modified(|current| {
            if matches!(current, TrackerState::Polling { .. }) {
                *current = TrackerState::Idle;
                true
            } else {
                false
            }
        });
    }

    pub fn state(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    pub fn watch_state(&self) -> watch::Receiver<TrackerState> {
        self.state.subscribe()
    }

    async fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled, or finished on its own.
            let _ = task.await;
        }
    }
}

impl<S, N> Drop for PollingSession<S, N>
where
    S: StatusSource + ?Sized + 'static,
    N: NotificationSink + ?Sized + 'static,
{
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tracker::FlashSink;
    use crate::domain::entities::{NewShipment, Notification, ServiceLevel, ShipmentStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn sample(tracking: &str, status: ShipmentStatus) -> Shipment {
        let mut shipment = Shipment::new(
            tracking.to_string(),
            NewShipment {
                sender: "Alice".to_string(),
                recipient: "Bob".to_string(),
                origin: "NY".to_string(),
                destination: "LA".to_string(),
                weight: 2.0,
                service: ServiceLevel::Express,
            },
            Utc::now(),
        );
        if status != ShipmentStatus::Created {
            shipment.record_status(status, "", Utc::now());
        }
        shipment
    }

    /// Replays a fixed sequence of answers, repeating the last one forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<ShipmentStatus, ()>>>,
        fetches: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<ShipmentStatus, ()>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, tracking: &str) -> Result<Shipment, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.pop_front()
                } else {
                    script.front().cloned()
                }
            };
            match next {
                Some(Ok(status)) => Ok(sample(tracking, status)),
                Some(Err(())) => Err(AppError::internal("source unavailable", json!({}))),
                None => Err(AppError::shipment_not_found(tracking)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        fn messages(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.message.clone())
                .collect()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }

        fn clear(&self) {}
    }

    const PERIOD: Duration = DEFAULT_POLL_INTERVAL;

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_period_and_notifies_once() {
        let source = ScriptedSource::new(vec![
            Ok(ShipmentStatus::Created),
            Ok(ShipmentStatus::Created),
            Ok(ShipmentStatus::Created),
            Ok(ShipmentStatus::InTransit),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = PollingSession::new(source.clone(), sink.clone(), PERIOD);

        session.lookup("SHP-1").await.unwrap();
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(source.fetches(), 1);

        tokio::time::sleep(Duration::from_secs(22)).await;
        assert_eq!(source.fetches(), 4);
        assert_eq!(sink.messages(), vec!["Shipment status updated: In Transit"]);
        assert_eq!(
            session.state(),
            TrackerState::Polling {
                tracking: "SHP-1".to_string(),
                last_status: ShipmentStatus::InTransit,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_polling() {
        let source = ScriptedSource::new(vec![Ok(ShipmentStatus::PickedUp), Err(())]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = PollingSession::new(source.clone(), sink.clone(), PERIOD);
        let mut states = session.watch_state();

        session.lookup("SHP-1").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;

        states.changed().await.unwrap();
        assert!(matches!(
            &*states.borrow_and_update(),
            TrackerState::Stopped { tracking, .. } if tracking == "SHP-1"
        ));
        assert_eq!(sink.messages(), vec!["Error updating status"]);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_loop() {
        let source = ScriptedSource::new(vec![Ok(ShipmentStatus::Created)]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = PollingSession::new(source.clone(), sink, PERIOD);

        session.lookup("SHP-1").await.unwrap();
        session.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.fetches(), 1);
        assert_eq!(session.state(), TrackerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_leaves_no_loop() {
        let source = ScriptedSource::new(vec![]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = PollingSession::new(source.clone(), sink, PERIOD);

        let err = session.lookup("SHP-404").await.unwrap_err();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(err.is_not_found());
        assert_eq!(source.fetches(), 1);
        assert_eq!(session.state(), TrackerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relookup_replaces_loop() {
        let source = ScriptedSource::new(vec![Ok(ShipmentStatus::Created)]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = PollingSession::new(source.clone(), sink, PERIOD);

        session.lookup("SHP-1").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        session.lookup("SHP-2").await.unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;

        // Two lookups plus polls at 15s and 25s of the second loop only.
        assert_eq!(source.fetches(), 4);
        assert!(matches!(
            session.state(),
            TrackerState::Polling { tracking, .. } if tracking == "SHP-2"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_reaches_flash_sink() {
        let source = ScriptedSource::new(vec![
            Ok(ShipmentStatus::OutForDelivery),
            Ok(ShipmentStatus::Delivered),
        ]);
        let sink = Arc::new(FlashSink::default());
        let mut session = PollingSession::new(source, sink.clone(), PERIOD);

        session.lookup("SHP-1").await.unwrap();
        assert!(sink.current().is_none());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(
            sink.current().map(|n| n.message),
            Some("Shipment status updated: Delivered".to_string())
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(sink.current().is_none());
    }

    /// Reports `Created` for every code, except that the second fetch of
    /// `SHP-1` holds its worker thread for a while and then reports `Delivered`.
    #[derive(Default)]
    struct SlowSecondFetch {
        first_code_fetches: AtomicUsize,
        slow_fetch_started: Notify,
    }

    #[async_trait]
    impl StatusSource for SlowSecondFetch {
        async fn fetch(&self, tracking: &str) -> Result<Shipment, AppError> {
            if tracking == "SHP-1"
                && self.first_code_fetches.fetch_add(1, Ordering::SeqCst) == 1
            {
                self.slow_fetch_started.notify_one();
                std::thread::sleep(Duration::from_millis(300));
                return Ok(sample(tracking, ShipmentStatus::Delivered));
            }
            Ok(sample(tracking, ShipmentStatus::Created))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_relookup_discards_in_flight_poll() {
        let source = Arc::new(SlowSecondFetch::default());
        let sink = Arc::new(FlashSink::default());
        let mut session =
            PollingSession::new(source.clone(), sink.clone(), Duration::from_millis(20));

        session.lookup("SHP-1").await.unwrap();
        source.slow_fetch_started.notified().await;

        session.lookup("SHP-2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(sink.current().is_none());
        assert_eq!(
            session.state(),
            TrackerState::Polling {
                tracking: "SHP-2".to_string(),
                last_status: ShipmentStatus::Created,
            }
        );
        assert_eq!(source.first_code_fetches.load(Ordering::SeqCst), 2);
    }
}
