//! Handler for the device-selection endpoint.

use axum::{http::HeaderMap, Extension, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::DeviceResponse;
use crate::services::BankIdService;

/// GET /api/device
///
/// Device selection recorded by the session's last completed order, so
/// the frontend can preselect the same flow.
pub async fn device_handler(
    Extension(service): Extension<Arc<BankIdService>>,
    headers: HeaderMap,
) -> Result<Json<DeviceResponse>, ApiError> {
    let session_id = super::session_id(&headers)?;
    let previous_device = service.previous_device(&session_id).await?;
    Ok(Json(DeviceResponse { previous_device }))
}
