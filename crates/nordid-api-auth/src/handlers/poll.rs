//! Handler for the poll endpoint.

use axum::{
    extract::{ConnectInfo, Query},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;

use nordid_rp::{QrData, QrGenerator};

use crate::error::ApiError;
use crate::models::{ApiResponse, PollBody, PollQuery, ResolvedStatus};
use crate::services::{BankIdService, PollRequest};

/// POST /api/poll
///
/// Starts or advances the order for the caller's session and answers
/// with the resolved status and message code. With `?qr=true` the
/// response carries the QR payload while the order is pending.
pub async fn poll_handler(
    Extension(service): Extension<Arc<BankIdService>>,
    Extension(qr_generator): Extension<Arc<dyn QrGenerator>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<PollQuery>,
    Json(body): Json<PollBody>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session_id = super::session_id(&headers)?;

    let resolved = service
        .poll(&PollRequest {
            session_id,
            show_qr: query.qr,
            operation: body.operation,
            personal_number: body.personal_number,
            end_user_ip: addr.ip().to_string(),
            user_visible_data: body.message,
        })
        .await?;

    Ok(Json(to_response(resolved, qr_generator.as_ref())))
}

fn to_response(resolved: ResolvedStatus, qr_generator: &dyn QrGenerator) -> ApiResponse {
    let qr_code = resolved.qr.as_ref().map(|material| {
        let elapsed = (Utc::now() - material.order_started_at)
            .to_std()
            .unwrap_or_default();
        qr_generator.generate(&QrData {
            auto_start_token: &material.auto_start_token,
            qr_start_token: &material.qr_start_token,
            qr_start_secret: &material.qr_start_secret,
            elapsed,
        })
    });
    let auto_start_token = resolved
        .qr
        .as_ref()
        .map(|material| material.auto_start_token.clone());

    ApiResponse {
        status: resolved.status,
        message_code: resolved.message_code,
        qr_code,
        auto_start_token,
    }
}
