//! Authenticator API client.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use nordid_core::OrderRef;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RpError;
use crate::types::{
    AuthenticateRequest, CollectResponse, ErrorCode, OrderResponse, SignRequest,
};

/// Client boundary to the remote authenticator.
///
/// All calls are asynchronous; failures are [`RpError`] values, never a
/// collect snapshot. A `FAILED` collect status is a normal answer, not an
/// error of this trait.
#[async_trait]
pub trait RpClient: Send + Sync {
    /// Starts an authentication order.
    async fn authenticate(&self, request: &AuthenticateRequest) -> Result<OrderResponse, RpError>;

    /// Starts a signing order.
    async fn sign(&self, request: &SignRequest) -> Result<OrderResponse, RpError>;

    /// Fetches the current status snapshot for an order.
    async fn collect(&self, order_ref: &OrderRef) -> Result<CollectResponse, RpError>;

    /// Cancels an order. The caller treats failures as best-effort.
    async fn cancel(&self, order_ref: &OrderRef) -> Result<(), RpError>;
}

/// Error document returned by the authenticator on rejected calls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_code: Option<ErrorCode>,
    #[serde(default)]
    details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderRefBody<'a> {
    order_ref: &'a OrderRef,
}

/// HTTPS implementation of [`RpClient`].
#[derive(Clone)]
pub struct HttpRpClient {
    base_url: String,
    http: Client,
}

impl HttpRpClient {
    /// Create a client against the given API base URL, e.g.
    /// `https://appapi2.test.bankid.com/rp/v6.0`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Create a client with a caller-provided `reqwest::Client`, for
    /// custom TLS setups (the provider requires mutual TLS in production).
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Base64-encodes user-visible text the way the provider expects it.
    #[must_use]
    pub fn encode_user_visible_data(text: &str) -> String {
        BASE64.encode(text.as_bytes())
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RpError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.http.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_body: ApiErrorBody =
                response.json().await.unwrap_or(ApiErrorBody {
                    error_code: None,
                    details: String::new(),
                });
            debug!(%url, status = status.as_u16(), code = ?error_body.error_code, "provider rejected call");
            return Err(RpError::Provider {
                status: status.as_u16(),
                code: error_body.error_code,
                details: error_body.details,
            });
        }

        response.json().await.map_err(|e| RpError::InvalidResponse {
            cause: e.to_string(),
        })
    }
}

#[async_trait]
impl RpClient for HttpRpClient {
    async fn authenticate(&self, request: &AuthenticateRequest) -> Result<OrderResponse, RpError> {
        self.post("/auth", request).await
    }

    async fn sign(&self, request: &SignRequest) -> Result<OrderResponse, RpError> {
        self.post("/sign", request).await
    }

    async fn collect(&self, order_ref: &OrderRef) -> Result<CollectResponse, RpError> {
        self.post("/collect", &OrderRefBody { order_ref }).await
    }

    async fn cancel(&self, order_ref: &OrderRef) -> Result<(), RpError> {
        // The provider answers an empty JSON object on success.
        let _: serde_json::Value = self.post("/cancel", &OrderRefBody { order_ref }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = HttpRpClient::new("https://example.test/rp/v6.0/");
        assert_eq!(client.base_url, "https://example.test/rp/v6.0");
    }

    #[test]
    fn test_user_visible_data_is_base64() {
        let encoded = HttpRpClient::encode_user_visible_data("Logga in");
        assert_eq!(encoded, "TG9nZ2EgaW4=");
    }

    #[test]
    fn test_error_body_parses_provider_codes() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"errorCode":"alreadyInProgress","details":"Order exists"}"#)
                .unwrap();
        assert_eq!(body.error_code, Some(ErrorCode::AlreadyInProgress));
    }
}
