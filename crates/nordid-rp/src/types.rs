//! Wire types for the authenticator API.
//!
//! The authenticator speaks camelCase JSON; every wire DTO carries the
//! matching serde rename so the structs can be used directly as
//! request/response bodies.

use nordid_core::OrderRef;
use serde::{Deserialize, Serialize};

/// The kind of order a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Authentication order.
    Auth,
    /// Signing order.
    Sign,
}

/// Top-level status of a collect snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectStatus {
    Pending,
    Failed,
    Complete,
}

/// Sub-status reported while an order is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressStatus {
    /// Order created, the client app has not picked it up yet.
    OutstandingTransaction,
    /// No client app has started for this order.
    NoClient,
    /// A client app has started.
    Started,
    /// The user is confirming in the client app.
    UserSign,
    /// The user is scanning a machine-readable travel document.
    UserMrtd,
    /// Unrecognized hint from a newer authenticator version.
    #[serde(other)]
    Unknown,
}

/// Error code reported for a failed order or a rejected API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    AlreadyInProgress,
    InvalidParameters,
    Cancelled,
    UserCancel,
    ExpiredTransaction,
    CertificateErr,
    StartFailed,
    RequestTimeout,
    Maintenance,
    InternalError,
    /// Unrecognized code from a newer authenticator version.
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    /// True for failures where the current order reference is dead and a
    /// replacement order may be started in its place.
    #[must_use]
    pub fn is_order_expiry(&self) -> bool {
        matches!(self, ErrorCode::ExpiredTransaction | ErrorCode::StartFailed)
    }
}

/// Response to a successful order initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Handle for collect/cancel calls on this order.
    pub order_ref: OrderRef,
    /// Token for launching the client app on the same device.
    pub auto_start_token: String,
    /// Token for the device-switch QR payload.
    pub qr_start_token: String,
    /// Secret for the device-switch QR payload.
    pub qr_start_secret: String,
}

/// One snapshot of order progress from the authenticator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResponse {
    pub order_ref: OrderRef,
    pub status: CollectStatus,
    /// Sub-status, populated while `status` is pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_status: Option<ProgressStatus>,
    /// Failure code, populated when `status` is failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Completion document, populated when `status` is complete. Passed
    /// through opaquely; assertion issuance happens outside this core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_data: Option<serde_json::Value>,
}

impl CollectResponse {
    /// Builds a collect-shaped failure from a provider rejection so it can
    /// flow through the ordinary status resolution path.
    #[must_use]
    pub fn failed(order_ref: OrderRef, error_code: ErrorCode) -> Self {
        Self {
            order_ref,
            status: CollectStatus::Failed,
            progress_status: None,
            error_code: Some(error_code),
            completion_data: None,
        }
    }

    /// True when the underlying order reference can no longer be collected.
    #[must_use]
    pub fn is_order_expiry(&self) -> bool {
        self.status == CollectStatus::Failed
            && self.error_code.is_some_and(|c| c.is_order_expiry())
    }
}

/// Request to initiate an authentication order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    /// Subject identifier, when the relying party pins the user up front.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_number: Option<String>,
    /// IP address of the end user's browser, as required by the provider.
    pub end_user_ip: String,
    /// Base64-encoded text shown to the user in the client app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_visible_data: Option<String>,
}

/// Request to initiate a signing order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_number: Option<String>,
    pub end_user_ip: String,
    /// Base64-encoded text the user signs. Required for sign orders.
    pub user_visible_data: String,
}
