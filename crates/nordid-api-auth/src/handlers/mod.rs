//! HTTP handlers for the poll API.

pub mod cancel;
pub mod device;
pub mod poll;

pub use cancel::cancel_handler;
pub use device::device_handler;
pub use poll::poll_handler;

use axum::http::HeaderMap;
use nordid_core::SessionId;

use crate::error::ApiError;

/// Header carrying the caller's session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extracts and parses the session identifier from the request headers.
pub(crate) fn session_id(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidRequest(format!("Missing {SESSION_HEADER} header")))?;

    raw.parse()
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid {SESSION_HEADER} header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_is_parsed_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            SESSION_HEADER,
            HeaderValue::from_static("550e8400-e29b-41d4-a716-446655440000"),
        );
        let id = session_id(&headers).unwrap();
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            session_id(&headers),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(matches!(
            session_id(&headers),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
