//! DTOs for shipment endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use serde_with::{NoneAsEmptyString, serde_as};
use validator::{Validate, ValidationError};

use crate::domain::entities::{NewShipment, ServiceLevel, Shipment, ShipmentFilter, ShipmentStatus};
use crate::error::AppError;
use crate::utils::weight::coerce_weight;

/// Request to create a shipment.
///
/// Address fields also accept the `fromAddress` / `toAddress` spellings and the
/// recipient may be sent as `toName`. `weight` is coerced leniently and never
/// rejected.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub sender: String,

    #[serde(default, alias = "toName")]
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub recipient: String,

    #[serde(default, alias = "fromAddress")]
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub origin: String,

    #[serde(default, alias = "toAddress")]
    #[validate(custom(function = "not_blank"), length(max = 500))]
    pub destination: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceLevel>,
}

impl CreateShipmentRequest {
    pub fn into_new_shipment(self) -> NewShipment {
        NewShipment {
            weight: coerce_weight(self.weight.as_ref()),
            sender: self.sender,
            recipient: self.recipient,
            origin: self.origin,
            destination: self.destination,
            service: self.service.unwrap_or_default(),
        }
        .normalized()
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Body of `PUT /api/shipments/{tracking}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SetStatusRequest {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `status` is not one of the five
    /// lifecycle statuses.
    pub fn parse_status(&self) -> Result<ShipmentStatus, AppError> {
        parse_status(&self.status)
    }
}

/// Query string of `GET /api/shipments`.
///
/// Empty parameters (`?q=&status=`) are treated as absent.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ListShipmentsParams {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub q: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub status: Option<String>,
}

impl ListShipmentsParams {
    pub fn into_filter(self) -> Result<ShipmentFilter, AppError> {
        Ok(ShipmentFilter {
            status: self.status.as_deref().map(parse_status).transpose()?,
            query: self.q,
        })
    }
}

fn parse_status(raw: &str) -> Result<ShipmentStatus, AppError> {
    raw.parse().map_err(|_| {
        AppError::bad_request(
            "Unknown status",
            json!({
                "status": raw,
                "allowed": ShipmentStatus::ORDER.map(ShipmentStatus::as_str),
            }),
        )
    })
}

/// A single shipment wrapped as `{"shipment": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentEnvelope {
    pub shipment: Shipment,
}

/// Filtered shipment list, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentListResponse {
    pub total: usize,
    pub items: Vec<Shipment>,
}
