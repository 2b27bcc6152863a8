//! Handlers for shipment endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::{
    CreateShipmentRequest, ListShipmentsParams, SetStatusRequest, ShipmentEnvelope,
    ShipmentListResponse,
};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a shipment.
///
/// # Endpoint
///
/// `POST /api/shipments`
///
/// # Request Body
///
/// ```json
/// {
///   "sender": "Alice",
///   "recipient": "Bob",
///   "origin": "NY",
///   "destination": "LA",
///   "weight": "5",          // number or numeric string, optional
///   "service": "Express"    // optional, defaults to Ground
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if a text field is blank.
pub async fn create_shipment_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentEnvelope>), AppError> {
    payload.validate()?;

    let shipment = state
        .registry
        .create(payload.into_new_shipment())
        .await?;

    Ok((StatusCode::CREATED, Json(ShipmentEnvelope { shipment })))
}

/// Returns one shipment with its full history.
///
/// # Endpoint
///
/// `GET /api/shipments/{tracking}` (public)
pub async fn get_shipment_handler(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> Result<Json<ShipmentEnvelope>, AppError> {
    let shipment = state.registry.lookup(&tracking).await?;
    Ok(Json(ShipmentEnvelope { shipment }))
}

/// Lists shipments, most recent first.
///
/// # Endpoint
///
/// `GET /api/shipments?q=<substring>&status=<status>`
///
/// `q` matches tracking code, sender or recipient (case-sensitive); `status`
/// must be one of the exact status strings. Empty parameters are ignored.
pub async fn list_shipments_handler(
    State(state): State<AppState>,
    Query(params): Query<ListShipmentsParams>,
) -> Result<Json<ShipmentListResponse>, AppError> {
    let filter = params.into_filter()?;
    let items = state.registry.list(&filter).await;

    Ok(Json(ShipmentListResponse {
        total: items.len(),
        items,
    }))
}

/// `POST /api/shipments/{tracking}/advance`
pub async fn advance_shipment_handler(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> Result<Json<ShipmentEnvelope>, AppError> {
    let shipment = state.registry.advance_status(&tracking).await?;
    Ok(Json(ShipmentEnvelope { shipment }))
}

/// Sets a status directly.
///
/// # Endpoint
///
/// `PUT /api/shipments/{tracking}/status`
///
/// ```json
/// { "status": "Out for Delivery", "note": "Handed to courier" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for an unknown status string and 404 for an
/// unknown tracking code.
pub async fn set_status_handler(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<ShipmentEnvelope>, AppError> {
    let status = payload.parse_status()?;
    let shipment = state
        .registry
        .set_status(&tracking, status, payload.note.unwrap_or_default())
        .await?;

    Ok(Json(ShipmentEnvelope { shipment }))
}

/// `DELETE /api/shipments/{tracking}`
pub async fn delete_shipment_handler(
    State(state): State<AppState>,
    Path(tracking): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.remove(&tracking).await?;
    Ok(StatusCode::NO_CONTENT)
}
