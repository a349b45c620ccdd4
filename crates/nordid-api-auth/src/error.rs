//! Error types for the poll API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use nordid_session::SessionError;

/// Errors surfaced by the poll API.
///
/// Provider rejections never appear here; the orchestrator converts them
/// into collect-shaped failures that flow through the status resolver.
/// Only infrastructure failures reach the caller as errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (missing or unparsable session identifier).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure talking to the authenticator. The session is
    /// left untouched so a retry can resume from the last known state.
    #[error("Authenticator unavailable: {0}")]
    Provider(String),

    /// Session or lock store failure.
    #[error("Session store failure: {0}")]
    Session(#[from] SessionError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            ApiError::Provider(cause) => {
                tracing::warn!("Authenticator transport failure: {}", cause);
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_unavailable",
                    "The authentication service could not be reached".to_string(),
                )
            }
            ApiError::Session(e) => {
                tracing::error!("Session store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
