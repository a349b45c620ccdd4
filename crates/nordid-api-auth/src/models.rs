//! Request and response models for the poll API.

use chrono::{DateTime, Utc};
use nordid_rp::{CollectResponse, CollectStatus, Operation};
use serde::{Deserialize, Serialize};

/// Stable top-level outcome of one poll call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    /// Order pending; keep polling.
    InProgress,
    /// Order finished successfully; the session has been retired.
    Complete,
    /// Order failed; the message code says how.
    Failed,
    /// Hard expiry: the attempt exceeded the replacement window.
    TimeExpired,
    /// Another poll for this session holds the lock and no snapshot is
    /// stored yet; retry shortly without any provider call having been
    /// made.
    Retry,
}

/// QR material carried alongside a pending resolved status so the caller
/// can render the device-switch payload.
#[derive(Debug, Clone)]
pub struct QrMaterial {
    pub auto_start_token: String,
    pub qr_start_token: String,
    pub qr_start_secret: String,
    /// Creation time of the current order, for rolling payloads.
    pub order_started_at: DateTime<Utc>,
}

/// Outcome of one poll, resolved to a stable message code.
#[derive(Debug, Clone)]
pub struct ResolvedStatus {
    pub status: PollStatus,
    /// Namespaced lookup key for user-facing text (`bankid.msg.*`).
    pub message_code: String,
    /// QR material, present only when the caller polls via the QR flow
    /// and the order is pending.
    pub qr: Option<QrMaterial>,
    /// Raw collect snapshot for downstream rendering, when one exists.
    pub collect: Option<CollectResponse>,
}

impl ResolvedStatus {
    /// Terminal response for a hard-expired attempt.
    #[must_use]
    pub fn time_expired() -> Self {
        Self {
            status: PollStatus::TimeExpired,
            message_code: format!("{}error.timeout", crate::services::status_code::MESSAGE_PREFIX),
            qr: None,
            collect: None,
        }
    }

    /// Response for a lock-contended poll with no stored snapshot.
    #[must_use]
    pub fn retry() -> Self {
        Self {
            status: PollStatus::Retry,
            message_code: format!("{}blank", crate::services::status_code::MESSAGE_PREFIX),
            qr: None,
            collect: None,
        }
    }

    /// Maps a collect status onto the top-level poll status.
    #[must_use]
    pub fn status_of(collect: &CollectResponse) -> PollStatus {
        match collect.status {
            CollectStatus::Pending => PollStatus::InProgress,
            CollectStatus::Complete => PollStatus::Complete,
            CollectStatus::Failed => PollStatus::Failed,
        }
    }
}

/// Query parameters for `POST /api/poll`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PollQuery {
    /// Whether the caller polls via the QR device-switch flow.
    #[serde(default)]
    pub qr: bool,
}

/// Request body for `POST /api/poll`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollBody {
    /// Order kind for a fresh session. Ignored once an order exists.
    #[serde(default = "default_operation")]
    pub operation: Operation,
    /// Subject identifier, when the relying party pins the user.
    #[serde(default)]
    pub personal_number: Option<String>,
    /// Text shown to the user in the client app.
    #[serde(default)]
    pub message: Option<String>,
}

fn default_operation() -> Operation {
    Operation::Auth
}

/// Wire response for `POST /api/poll`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: PollStatus,
    pub message_code: String,
    /// QR payload string, present while the QR flow is pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// App-launch token for the same-device flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_token: Option<String>,
}

/// Wire response for `GET /api/device`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub previous_device: Option<nordid_session::PreviousDeviceSelection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_body_defaults_to_auth() {
        let body: PollBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.operation, Operation::Auth);
        assert!(body.personal_number.is_none());
        assert!(body.message.is_none());
    }

    #[test]
    fn test_api_response_wire_format() {
        let response = ApiResponse {
            status: PollStatus::InProgress,
            message_code: "bankid.msg.ext2".to_string(),
            qr_code: Some("bankid:///?autostarttoken=a&redirect=null".to_string()),
            auto_start_token: Some("a".to_string()),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "IN_PROGRESS");
        assert_eq!(json["messageCode"], "bankid.msg.ext2");
        assert_eq!(json["autoStartToken"], "a");
    }

    #[test]
    fn test_absent_qr_fields_are_omitted() {
        let response = ApiResponse {
            status: PollStatus::Failed,
            message_code: "bankid.msg.rfa6".to_string(),
            qr_code: None,
            auto_start_token: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("qrCode").is_none());
        assert!(json.get("autoStartToken").is_none());
    }

    #[test]
    fn test_device_response_uses_kebab_case_selection() {
        let response = DeviceResponse {
            previous_device: Some(nordid_session::PreviousDeviceSelection::ThisDevice),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["previousDevice"], "this-device");
    }
}
