//! Server configuration loaded from environment variables.
//!
//! Required variables must be present and valid or the server exits
//! with a clear error message at startup.

use std::env;
use thiserror::Error;

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Server bind address.
    pub host: String,

    /// Server listen port.
    pub port: u16,

    /// Base URL of the authenticator's relying-party API, e.g.
    /// `https://appapi2.test.bankid.com/rp/v6.0`.
    pub bankid_base_url: String,

    /// PostgreSQL connection string. When unset the server falls back
    /// to in-memory stores, which only suit a single instance.
    pub database_url: Option<String>,
}

impl IdpConfig {
    /// Load configuration from environment variables.
    ///
    /// # Required Variables
    ///
    /// - `BANKID_BASE_URL` - authenticator API base URL
    ///
    /// # Optional Variables
    ///
    /// - `DATABASE_URL` - PostgreSQL connection string
    /// - `HOST` - bind address (default: "0.0.0.0")
    /// - `PORT` - listen port (default: 8443)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bankid_base_url = env::var("BANKID_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("BANKID_BASE_URL".to_string()))?;

        if !bankid_base_url.starts_with("http://") && !bankid_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "BANKID_BASE_URL".to_string(),
                message: "Must be an http(s) URL".to_string(),
            });
        }

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8443".to_string())
            .parse()?;

        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            bankid_base_url,
            database_url,
        })
    }

    /// The server bind address as a socket address string.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = IdpConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            bankid_base_url: "https://appapi2.test.bankid.com/rp/v6.0".to_string(),
            database_url: None,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingVar("BANKID_BASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: BANKID_BASE_URL"
        );

        let err = ConfigError::InvalidValue {
            var: "PORT".to_string(),
            message: "Must be a number".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for PORT: Must be a number");
    }

    // Env-var-dependent scenarios run in a single test to avoid races
    // when tests run in parallel.
    #[test]
    fn test_from_env_scenarios() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("DATABASE_URL");

        // Missing base URL fails fast.
        std::env::remove_var("BANKID_BASE_URL");
        assert!(matches!(
            IdpConfig::from_env(),
            Err(ConfigError::MissingVar(_))
        ));

        // Non-URL base URL is rejected.
        std::env::set_var("BANKID_BASE_URL", "not-a-url");
        assert!(matches!(
            IdpConfig::from_env(),
            Err(ConfigError::InvalidValue { .. })
        ));

        // Defaults apply when only the base URL is set.
        std::env::set_var("BANKID_BASE_URL", "https://appapi2.test.bankid.com/rp/v6.0");
        let config = IdpConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8443);
        assert!(config.database_url.is_none());

        std::env::remove_var("BANKID_BASE_URL");
    }
}
