//! Error types for the session crate.

use thiserror::Error;

/// Errors that can occur in session and lock storage.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Backing store failure. The caller may retry; the stored state is
    /// left untouched.
    #[error("Session store failure: {cause}")]
    Store { cause: String },

    /// A stored record could not be decoded.
    #[error("Corrupt session record for {key}: {cause}")]
    Corrupt { key: String, cause: String },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SessionError {
    /// Create a store error from any displayable cause.
    pub fn store(cause: impl std::fmt::Display) -> Self {
        Self::Store {
            cause: cause.to_string(),
        }
    }
}
