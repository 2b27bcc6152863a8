//! Shipment status enumeration and its fixed ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A step in the delivery lifecycle.
///
/// Serialized as the display string (`"Picked up"`, `"In Transit"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    #[serde(rename = "Created")]
    Created,
    #[serde(rename = "Picked up")]
    PickedUp,
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    #[serde(rename = "Delivered")]
    Delivered,
}

/// Returned when a string does not name a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shipment status '{0}'")]
pub struct ParseStatusError(pub String);

impl ShipmentStatus {
    /// All statuses in lifecycle order.
    pub const ORDER: [ShipmentStatus; 5] = [
        ShipmentStatus::Created,
        ShipmentStatus::PickedUp,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Created => "Created",
            ShipmentStatus::PickedUp => "Picked up",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
        }
    }

    /// Zero-based index in [`Self::ORDER`].
    pub fn position(self) -> usize {
        match self {
            ShipmentStatus::Created => 0,
            ShipmentStatus::PickedUp => 1,
            ShipmentStatus::InTransit => 2,
            ShipmentStatus::OutForDelivery => 3,
            ShipmentStatus::Delivered => 4,
        }
    }

    /// The following status, saturating at [`ShipmentStatus::Delivered`].
    pub fn next(self) -> Self {
        let last = Self::ORDER.len() - 1;
        Self::ORDER[(self.position() + 1).min(last)]
    }

    pub fn is_terminal(self) -> bool {
        self == ShipmentStatus::Delivered
    }

    /// Share of the lifecycle completed, counting the current step.
    pub fn progress_percent(self) -> u8 {
        ((self.position() + 1) * 100 / Self::ORDER.len()) as u8
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = ParseStatusError;

    /// Exact, case-sensitive match against the display strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
