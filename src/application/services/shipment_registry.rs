//! Shipment registry: the authoritative in-memory collection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::entities::{NewShipment, Shipment, ShipmentFilter, ShipmentStatus};
use crate::domain::repositories::{ShipmentStore, StatusSource};
use crate::error::AppError;
use crate::utils::tracking_code::{CodeGenerator, RandomCodeGenerator};

/// Note recorded by [`ShipmentRegistry::mark_delivered`].
pub const MARK_DELIVERED_NOTE: &str = "Marked delivered by user";

/// Owns the shipment collection and serializes every mutation through it.
///
/// The collection is ordered most-recent-first. Each mutation is computed on a
/// copy, written to the [`ShipmentStore`] in full, and only then committed in
/// memory, so a failed write leaves the registry unchanged. The lock is held
/// across the write: two updates to the same shipment can never interleave.
pub struct ShipmentRegistry<S: ShipmentStore + ?Sized> {
    store: Arc<S>,
    shipments: Mutex<Vec<Shipment>>,
    tracking_prefix: String,
    codes: Arc<dyn CodeGenerator>,
}

impl<S: ShipmentStore + ?Sized> ShipmentRegistry<S> {
    /// Creates a registry over an already loaded collection.
    pub fn new(store: Arc<S>, tracking_prefix: impl Into<String>, shipments: Vec<Shipment>) -> Self {
        Self {
            store,
            shipments: Mutex::new(shipments),
            tracking_prefix: tracking_prefix.into(),
            codes: Arc::new(RandomCodeGenerator),
        }
    }

    /// Replaces the source of tracking codes.
    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Reads the full collection from `store` and builds a registry over it.
    ///
    /// A record whose newest history entry disagrees with its status, or whose
    /// history is empty, gets a restoring entry prepended. The repair is
    /// written back with the next mutation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be read.
    pub async fn load(store: Arc<S>, tracking_prefix: impl Into<String>) -> Result<Self, AppError> {
        let mut shipments = store.load().await?;
        let now = Utc::now();
        for shipment in &mut shipments {
            if shipment.repair_history(now) {
                warn!(
                    tracking = %shipment.tracking,
                    status = %shipment.status,
                    "Stored history disagreed with status, repaired"
                );
            }
        }
        info!(count = shipments.len(), "Loaded shipments from store");
        Ok(Self::new(store, tracking_prefix, shipments))
    }

    /// Creates a shipment with a fresh tracking code and puts it first.
    ///
    /// Free-text fields are trimmed and the weight is clamped to a finite,
    /// non-negative value; this never rejects input.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if no unused tracking code could be
    /// generated or the store write fails.
    pub async fn create(&self, fields: NewShipment) -> Result<Shipment, AppError> {
        let fields = fields.normalized();
        let mut shipments = self.shipments.lock().await;

        let tracking = self.generate_unique_tracking(&shipments)?;
        let shipment = Shipment::new(tracking, fields, Utc::now());

        let mut next = Vec::with_capacity(shipments.len() + 1);
        next.push(shipment.clone());
        next.extend(shipments.iter().cloned());
        self.commit(&mut shipments, next).await?;

        metrics::counter!("shipments_created_total").increment(1);
        info!(tracking = %shipment.tracking, "Shipment created");

        Ok(shipment)
    }

    /// Finds a shipment by exact, case-sensitive tracking code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no shipment has this code.
    pub async fn lookup(&self, tracking: &str) -> Result<Shipment, AppError> {
        self.shipments
            .lock()
            .await
            .iter()
            .find(|s| s.tracking == tracking)
            .cloned()
            .ok_or_else(|| AppError::shipment_not_found(tracking))
    }

    /// Moves a shipment to the next status in lifecycle order.
    ///
    /// Advancing a delivered shipment keeps it `Delivered` but still records
    /// a history entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code, or
    /// [`AppError::Internal`] if the store write fails.
    pub async fn advance_status(&self, tracking: &str) -> Result<Shipment, AppError> {
        self.update(tracking, |shipment| {
            let from = shipment.status;
            let to = from.next();
            shipment.record_status(to, format!("Advanced from {from} to {to}"), Utc::now());
        })
        .await
    }

    /// Sets a status directly, regardless of lifecycle order.
    ///
    /// # Errors
    ///
    /// Same as [`Self::advance_status`].
    pub async fn set_status(
        &self,
        tracking: &str,
        status: ShipmentStatus,
        note: impl Into<String>,
    ) -> Result<Shipment, AppError> {
        let note = note.into();
        self.update(tracking, move |shipment| {
            shipment.record_status(status, note, Utc::now());
        })
        .await
    }

    /// Sets the status to `Delivered` with a fixed note.
    ///
    /// # Errors
    ///
    /// Same as [`Self::advance_status`].
    pub async fn mark_delivered(&self, tracking: &str) -> Result<Shipment, AppError> {
        self.set_status(tracking, ShipmentStatus::Delivered, MARK_DELIVERED_NOTE)
            .await
    }

    /// Deletes a shipment.
    ///
    /// Confirmation is the caller's job; the registry removes unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for an unknown code, or
    /// [`AppError::Internal`] if the store write fails.
    pub async fn remove(&self, tracking: &str) -> Result<(), AppError> {
        let mut shipments = self.shipments.lock().await;

        if !shipments.iter().any(|s| s.tracking == tracking) {
            return Err(AppError::shipment_not_found(tracking));
        }

        let next = shipments
            .iter()
            .filter(|s| s.tracking != tracking)
            .cloned()
            .collect();
        self.commit(&mut shipments, next).await?;

        metrics::counter!("shipments_deleted_total").increment(1);
        info!(tracking, "Shipment deleted");

        Ok(())
    }

    /// Returns the shipments matching `filter`, most-recent-first.
    pub async fn list(&self, filter: &ShipmentFilter) -> Vec<Shipment> {
        self.shipments
            .lock()
            .await
            .iter()
            .filter(|s| s.matches(filter))
            .cloned()
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.shipments.lock().await.len()
    }

    /// Reports whether the backing store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    /// Applies `mutate` to one shipment as a single read-modify-write.
    async fn update<F>(&self, tracking: &str, mutate: F) -> Result<Shipment, AppError>
    where
        F: FnOnce(&mut Shipment),
    {
        let mut shipments = self.shipments.lock().await;

        let Some(index) = shipments.iter().position(|s| s.tracking == tracking) else {
            return Err(AppError::shipment_not_found(tracking));
        };

        let mut next = shipments.clone();
        mutate(&mut next[index]);
        let updated = next[index].clone();
        self.commit(&mut shipments, next).await?;

        metrics::counter!("shipment_status_updates_total").increment(1);
        info!(tracking, status = %updated.status, "Shipment status updated");

        Ok(updated)
    }

    /// Persists `next` and, once the store accepted it, makes it current.
    async fn commit(&self, current: &mut Vec<Shipment>, next: Vec<Shipment>) -> Result<(), AppError> {
        if let Err(e) = self.store.save(&next).await {
            error!(error = %e, "Failed to persist shipments");
            return Err(e);
        }
        *current = next;
        Ok(())
    }

    /// Generates a tracking code not used by any shipment in `existing`.
    ///
    /// Tries the compact form up to 5 times, then the wide form up to 5 times.
    fn generate_unique_tracking(&self, existing: &[Shipment]) -> Result<String, AppError> {
        const MAX_ATTEMPTS: usize = 5;

        let is_taken = |code: &str| existing.iter().any(|s| s.tracking == code);

        for _ in 0..MAX_ATTEMPTS {
            let code = self.codes.compact(&self.tracking_prefix, Utc::now());
            if !is_taken(&code) {
                return Ok(code);
            }
        }

        warn!("Tracking code collisions, falling back to wide suffix");

        for _ in 0..MAX_ATTEMPTS {
            let code = self.codes.wide(&self.tracking_prefix, Utc::now());
            if !is_taken(&code) {
                return Ok(code);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique tracking code",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}

#[async_trait]
impl<S: ShipmentStore + ?Sized> StatusSource for ShipmentRegistry<S> {
    async fn fetch(&self, tracking: &str) -> Result<Shipment, AppError> {
        self.lookup(tracking).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ServiceLevel;
    use crate::domain::repositories::MockShipmentStore;
    use crate::utils::tracking_code::MockCodeGenerator;
    use std::collections::HashSet;

    fn fields(sender: &str, recipient: &str) -> NewShipment {
        NewShipment {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            origin: "NY".to_string(),
            destination: "LA".to_string(),
            weight: 5.0,
            service: ServiceLevel::Ground,
        }
    }

    fn accepting_store() -> MockShipmentStore {
        let mut store = MockShipmentStore::new();
        store.expect_save().returning(|_| Ok(()));
        store
    }

    fn registry(store: MockShipmentStore) -> ShipmentRegistry<MockShipmentStore> {
        ShipmentRegistry::new(Arc::new(store), "SHP", Vec::new())
    }

    fn assert_head_matches(shipment: &Shipment) {
        assert!(!shipment.history.is_empty());
        assert_eq!(shipment.history[0].status, shipment.status);
    }

    #[tokio::test]
    async fn test_load_reads_store() {
        let existing = Shipment::new("SHP-OLD-1".to_string(), fields("A", "B"), Utc::now());
        let mut store = MockShipmentStore::new();
        store
            .expect_load()
            .times(1)
            .returning(move || Ok(vec![existing.clone()]));

        let registry = ShipmentRegistry::load(Arc::new(store), "SHP").await.unwrap();

        assert_eq!(registry.count().await, 1);
        assert!(registry.lookup("SHP-OLD-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_load_repairs_inconsistent_history() {
        let mut no_history = Shipment::new("SHP-OLD-1".to_string(), fields("A", "B"), Utc::now());
        no_history.history.clear();
        let mut stale_head = Shipment::new("SHP-OLD-2".to_string(), fields("C", "D"), Utc::now());
        stale_head.status = ShipmentStatus::Delivered;
        let loaded = vec![no_history, stale_head];

        let mut store = MockShipmentStore::new();
        store.expect_load().returning(move || Ok(loaded.clone()));

        let registry = ShipmentRegistry::load(Arc::new(store), "SHP").await.unwrap();

        let repaired = registry.lookup("SHP-OLD-1").await.unwrap();
        assert_head_matches(&repaired);
        assert_eq!(repaired.history.len(), 1);

        let repaired = registry.lookup("SHP-OLD-2").await.unwrap();
        assert_head_matches(&repaired);
        assert_eq!(repaired.history[0].status, ShipmentStatus::Delivered);
        assert_eq!(repaired.history.len(), 2);
    }

    #[tokio::test]
    async fn test_load_propagates_store_error() {
        let mut store = MockShipmentStore::new();
        store
            .expect_load()
            .returning(|| Err(AppError::internal("boom", json!({}))));

        let result = ShipmentRegistry::load(Arc::new(store), "SHP").await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_create_scenario() {
        let mut store = MockShipmentStore::new();
        store
            .expect_save()
            .withf(|all| all.len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        let registry = registry(store);

        let shipment = registry.create(fields("Alice", "Bob")).await.unwrap();

        assert!(shipment.tracking.starts_with("SHP-"));
        assert_eq!(shipment.status, ShipmentStatus::Created);
        assert_eq!(shipment.weight, 5.0);
        assert_eq!(shipment.history.len(), 1);
        assert_eq!(shipment.history[0].status, ShipmentStatus::Created);
        assert_eq!(registry.lookup(&shipment.tracking).await.unwrap(), shipment);
    }

    #[tokio::test]
    async fn test_create_puts_newest_first() {
        let registry = registry(accepting_store());

        let first = registry.create(fields("Alice", "Bob")).await.unwrap();
        let second = registry.create(fields("Carol", "Dan")).await.unwrap();

        let all = registry.list(&ShipmentFilter::default()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tracking, second.tracking);
        assert_eq!(all[1].tracking, first.tracking);
    }

    #[tokio::test]
    async fn test_create_generates_unused_codes() {
        let registry = registry(accepting_store());

        let mut codes = HashSet::new();
        for i in 0..300 {
            let shipment = registry
                .create(fields(&format!("sender{i}"), "Bob"))
                .await
                .unwrap();
            assert!(codes.insert(shipment.tracking));
        }

        assert_eq!(registry.count().await, 300);
    }

    fn registry_with_taken_code(
        store: MockShipmentStore,
        codes: MockCodeGenerator,
    ) -> ShipmentRegistry<MockShipmentStore> {
        let taken = Shipment::new("SHP-TAKEN".to_string(), fields("A", "B"), Utc::now());
        ShipmentRegistry::new(Arc::new(store), "SHP", vec![taken])
            .with_code_generator(Arc::new(codes))
    }

    #[tokio::test]
    async fn test_create_falls_back_to_wide_code_after_collisions() {
        let mut codes = MockCodeGenerator::new();
        codes
            .expect_compact()
            .times(5)
            .returning(|_, _| "SHP-TAKEN".to_string());
        codes
            .expect_wide()
            .times(1)
            .returning(|prefix, _| format!("{prefix}-LX2K9A1B-0123456789AB"));
        let registry = registry_with_taken_code(accepting_store(), codes);

        let shipment = registry.create(fields("Alice", "Bob")).await.unwrap();

        assert_eq!(shipment.tracking, "SHP-LX2K9A1B-0123456789AB");
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_create_gives_up_when_every_code_collides() {
        let mut codes = MockCodeGenerator::new();
        codes
            .expect_compact()
            .times(5)
            .returning(|_, _| "SHP-TAKEN".to_string());
        codes
            .expect_wide()
            .times(5)
            .returning(|_, _| "SHP-TAKEN".to_string());
        // No save expectation: the store must not be written.
        let registry = registry_with_taken_code(MockShipmentStore::new(), codes);

        let result = registry.create(fields("Alice", "Bob")).await;

        match result {
            Err(AppError::Internal { message, .. }) => {
                assert_eq!(message, "Failed to generate unique tracking code");
            }
            other => panic!("expected internal error, got {other:?}"),
        }
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_create_failed_save_leaves_registry_unchanged() {
        let mut store = MockShipmentStore::new();
        store
            .expect_save()
            .returning(|_| Err(AppError::internal("disk full", json!({}))));
        let registry = registry(store);

        let result = registry.create(fields("Alice", "Bob")).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_advance_walks_lifecycle_then_stays_delivered() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        let mut observed = Vec::new();
        for _ in 0..4 {
            let shipment = registry.advance_status(&created.tracking).await.unwrap();
            assert_head_matches(&shipment);
            observed.push(shipment.status);
        }
        assert_eq!(
            observed,
            vec![
                ShipmentStatus::PickedUp,
                ShipmentStatus::InTransit,
                ShipmentStatus::OutForDelivery,
                ShipmentStatus::Delivered,
            ]
        );

        let fifth = registry.advance_status(&created.tracking).await.unwrap();
        assert_eq!(fifth.status, ShipmentStatus::Delivered);
        assert_eq!(fifth.history.len(), 6);
        assert_eq!(fifth.history[0].note, "Advanced from Delivered to Delivered");
        assert_head_matches(&fifth);
    }

    #[tokio::test]
    async fn test_advance_records_transition_note() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        let shipment = registry.advance_status(&created.tracking).await.unwrap();

        assert_eq!(shipment.history[0].note, "Advanced from Created to Picked up");
        assert_eq!(shipment.history[1].status, ShipmentStatus::Created);
    }

    #[tokio::test]
    async fn test_set_status_bypasses_order() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        let delivered = registry.mark_delivered(&created.tracking).await.unwrap();
        assert_eq!(delivered.status, ShipmentStatus::Delivered);
        assert_eq!(delivered.history[0].note, MARK_DELIVERED_NOTE);

        let back = registry
            .set_status(&created.tracking, ShipmentStatus::InTransit, "")
            .await
            .unwrap();
        assert_eq!(back.status, ShipmentStatus::InTransit);
        assert_eq!(back.history.len(), 3);
        assert_head_matches(&back);
    }

    #[tokio::test]
    async fn test_unknown_tracking_is_not_found() {
        let registry = registry(MockShipmentStore::new());

        assert!(registry.lookup("SHP-NOPE").await.unwrap_err().is_not_found());
        assert!(registry.advance_status("SHP-NOPE").await.unwrap_err().is_not_found());
        assert!(
            registry
                .set_status("SHP-NOPE", ShipmentStatus::Delivered, "x")
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(registry.remove("SHP-NOPE").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_lookup_is_case_sensitive() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        let lowered = created.tracking.to_lowercase();
        assert!(registry.lookup(&lowered).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_remove_then_lookup_is_not_found() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        registry.remove(&created.tracking).await.unwrap();

        assert!(registry.lookup(&created.tracking).await.unwrap_err().is_not_found());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_state() {
        let mut store = MockShipmentStore::new();
        let mut calls = 0;
        store.expect_save().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(())
            } else {
                Err(AppError::internal("unavailable", json!({})))
            }
        });
        let registry = registry(store);
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        assert!(registry.advance_status(&created.tracking).await.is_err());

        let current = registry.lookup(&created.tracking).await.unwrap();
        assert_eq!(current.status, ShipmentStatus::Created);
        assert_eq!(current.history.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let registry = registry(accepting_store());
        let alice = registry.create(fields("Alice", "Bob")).await.unwrap();
        registry.create(fields("Carol", "Dan")).await.unwrap();
        registry.create(fields("Erin", "Alice Jr")).await.unwrap();
        registry.advance_status(&alice.tracking).await.unwrap();

        let by_text = registry
            .list(&ShipmentFilter {
                query: Some("Alice".to_string()),
                status: None,
            })
            .await;
        assert_eq!(by_text.len(), 2);
        assert!(
            by_text
                .iter()
                .all(|s| s.sender.contains("Alice") || s.recipient.contains("Alice"))
        );

        let by_status = registry
            .list(&ShipmentFilter {
                query: None,
                status: Some(ShipmentStatus::PickedUp),
            })
            .await;
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].tracking, alice.tracking);

        let both = registry
            .list(&ShipmentFilter {
                query: Some("Alice".to_string()),
                status: Some(ShipmentStatus::Created),
            })
            .await;
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].sender, "Erin");
    }

    #[tokio::test]
    async fn test_registry_is_a_status_source() {
        let registry = registry(accepting_store());
        let created = registry.create(fields("Alice", "Bob")).await.unwrap();

        let fetched = registry.fetch(&created.tracking).await.unwrap();
        assert_eq!(fetched.tracking, created.tracking);
    }
}
