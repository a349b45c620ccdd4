//! Error types for the relying-party client.

use crate::types::ErrorCode;
use thiserror::Error;

/// Errors raised by authenticator API calls.
///
/// Provider rejections (the authenticator answered with an error
/// document) are distinct from transport failures (the call never
/// produced an answer); the orchestrator classifies them differently.
#[derive(Debug, Error)]
pub enum RpError {
    /// The HTTP call failed before a provider answer was received.
    #[error("Transport failure talking to the authenticator: {cause}")]
    Transport { cause: String },

    /// The authenticator rejected the call with an error document.
    #[error("Authenticator rejected the call ({status}): {code:?}")]
    Provider {
        /// HTTP status of the rejection.
        status: u16,
        /// Provider error code, when the body carried one.
        code: Option<ErrorCode>,
        /// Free-text details from the provider, for logging only.
        details: String,
    },

    /// The provider answered with a body this client cannot parse.
    #[error("Invalid response from the authenticator: {cause}")]
    InvalidResponse { cause: String },
}

impl RpError {
    /// Provider error code, when this is a provider rejection.
    #[must_use]
    pub fn provider_code(&self) -> Option<ErrorCode> {
        match self {
            RpError::Provider { code, .. } => *code,
            _ => None,
        }
    }

    /// True if the failure is transient and a later poll may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self.provider_code(),
            Some(ErrorCode::RequestTimeout | ErrorCode::Maintenance | ErrorCode::InternalError)
        )
    }
}

impl From<reqwest::Error> for RpError {
    fn from(e: reqwest::Error) -> Self {
        RpError::Transport {
            cause: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let maintenance = RpError::Provider {
            status: 503,
            code: Some(ErrorCode::Maintenance),
            details: String::new(),
        };
        assert!(maintenance.is_transient());

        let rejected = RpError::Provider {
            status: 400,
            code: Some(ErrorCode::AlreadyInProgress),
            details: String::new(),
        };
        assert!(!rejected.is_transient());

        let transport = RpError::Transport {
            cause: "connection refused".to_string(),
        };
        assert!(!transport.is_transient());
        assert_eq!(transport.provider_code(), None);
    }
}
