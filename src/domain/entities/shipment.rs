//! Shipment entity and its status history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ShipmentStatus;

/// Note attached to the first history entry of every shipment.
pub const CREATED_NOTE: &str = "Shipment created";

/// Note on the entry prepended by [`Shipment::repair_history`].
pub const RESTORED_NOTE: &str = "Status restored on load";

/// Carrier service level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceLevel {
    #[default]
    Ground,
    Express,
}

/// One recorded status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: ShipmentStatus,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

/// A shipment with its newest-first status history.
///
/// `history` is never empty and `history[0].status` always equals `status`;
/// both are only changed through [`Shipment::record_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub tracking: String,
    pub sender: String,
    pub recipient: String,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    #[serde(default)]
    pub service: ServiceLevel,
    pub status: ShipmentStatus,
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// Builds a freshly created shipment with a single `Created` history entry.
    pub fn new(tracking: String, fields: NewShipment, now: DateTime<Utc>) -> Self {
        Self {
            tracking,
            sender: fields.sender,
            recipient: fields.recipient,
            origin: fields.origin,
            destination: fields.destination,
            weight: fields.weight,
            service: fields.service,
            status: ShipmentStatus::Created,
            history: vec![HistoryEntry {
                status: ShipmentStatus::Created,
                at: now,
                note: CREATED_NOTE.to_string(),
            }],
            created_at: now,
        }
    }

    /// Prepends a history entry and makes `status` the current status.
    pub fn record_status(
        &mut self,
        status: ShipmentStatus,
        note: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.history.insert(
            0,
            HistoryEntry {
                status,
                at,
                note: note.into(),
            },
        );
        self.status = status;
    }

    /// Makes the newest history entry agree with `status`, prepending an entry
    /// stamped `at` when it does not. Returns true if anything changed.
    pub fn repair_history(&mut self, at: DateTime<Utc>) -> bool {
        if self
            .history
            .first()
            .is_some_and(|head| head.status == self.status)
        {
            return false;
        }
        self.record_status(self.status, RESTORED_NOTE, at);
        true
    }

    /// Returns true if the shipment passes every criterion set in `filter`.
    pub fn matches(&self, filter: &ShipmentFilter) -> bool {
        if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty())
            && !(self.tracking.contains(query)
                || self.sender.contains(query)
                || self.recipient.contains(query))
        {
            return false;
        }

        filter.status.is_none_or(|status| self.status == status)
    }
}

/// Input for creating a shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub sender: String,
    pub recipient: String,
    pub origin: String,
    pub destination: String,
    pub weight: f64,
    pub service: ServiceLevel,
}

impl NewShipment {
    /// Trims free-text fields and clamps the weight to a finite, non-negative value.
    pub fn normalized(self) -> Self {
        Self {
            sender: self.sender.trim().to_string(),
            recipient: self.recipient.trim().to_string(),
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            weight: if self.weight.is_finite() && self.weight > 0.0 {
                self.weight
            } else {
                0.0
            },
            service: self.service,
        }
    }
}

/// Criteria for listing shipments.
///
/// `query` is a case-sensitive substring matched against tracking code, sender
/// or recipient; `status` must match exactly. Both must hold when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentFilter {
    pub query: Option<String>,
    pub status: Option<ShipmentStatus>,
}
