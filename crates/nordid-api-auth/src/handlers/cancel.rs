//! Handler for the cancel endpoint.

use axum::{http::HeaderMap, http::StatusCode, Extension};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::BankIdService;

/// POST /api/cancel
///
/// Cancels the current order and retires the session. Idempotent; a
/// session without an order answers 204 as well.
pub async fn cancel_handler(
    Extension(service): Extension<Arc<BankIdService>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session_id = super::session_id(&headers)?;
    service.cancel(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
