//! Per-session order state.

use chrono::{DateTime, Duration, Utc};
use nordid_core::OrderRef;
use nordid_rp::{CollectResponse, CollectStatus, Operation, OrderResponse};
use serde::{Deserialize, Serialize};

/// Minutes after the original order creation at which a stale order can
/// no longer be silently replaced. The boundary is inclusive: exactly
/// three minutes is already hard-expired.
pub const HARD_EXPIRY_MINUTES: i64 = 3;

/// State of one active authentication or signing attempt.
///
/// Exactly one valid order reference exists per session at any instant.
/// A re-authentication replaces the order fields in one `save` while
/// `started_at` keeps the original order time, so the hard expiry window
/// is measured from the first initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSessionData {
    /// Handle for collect/cancel calls on the current order.
    pub order_ref: OrderRef,
    /// App-launch token for the current order.
    pub auto_start_token: String,
    /// QR token for the current order.
    pub qr_start_token: String,
    /// QR secret for the current order.
    pub qr_start_secret: String,
    /// Immutable for the lifetime of the session.
    pub operation: Operation,
    /// Immutable subject identifier, when pinned at initiation.
    pub personal_number: Option<String>,
    /// Time of the *original* order creation; preserved across
    /// re-authentication.
    pub started_at: DateTime<Utc>,
    /// Whether the caller polls via the QR device-switch flow.
    pub show_qr: bool,
    /// Set when the current order reference is dead but the session has
    /// not been retired yet; cleared by the next replacement order.
    pub expired: bool,
    /// Most recent collect snapshot.
    pub last_status: Option<CollectResponse>,
}

impl OrderSessionData {
    /// Builds session state for a freshly initiated order.
    #[must_use]
    pub fn from_order(
        order: &OrderResponse,
        operation: Operation,
        personal_number: Option<String>,
        show_qr: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            order_ref: order.order_ref.clone(),
            auto_start_token: order.auto_start_token.clone(),
            qr_start_token: order.qr_start_token.clone(),
            qr_start_secret: order.qr_start_secret.clone(),
            operation,
            personal_number,
            started_at,
            show_qr,
            expired: false,
            last_status: None,
        }
    }

    /// Merges a collect snapshot into the session state. Marks the
    /// session expired when the snapshot says the order reference is no
    /// longer collectable.
    #[must_use]
    pub fn with_collect(mut self, collect: &CollectResponse) -> Self {
        self.expired = collect.is_order_expiry();
        self.last_status = Some(collect.clone());
        self
    }

    /// True once the hard expiry deadline has been reached (inclusive).
    #[must_use]
    pub fn is_hard_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at >= Duration::minutes(HARD_EXPIRY_MINUTES)
    }

    /// True while the latest snapshot reports a pending order.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.last_status
            .as_ref()
            .is_some_and(|c| c.status == CollectStatus::Pending)
    }
}

/// Device choice recorded when an order completes, used to preselect the
/// flow on the user's next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreviousDeviceSelection {
    /// The user ran the client app on the polling device.
    ThisDevice,
    /// The user scanned the QR code with another device.
    Other,
}

impl PreviousDeviceSelection {
    /// Derives the selection from the session's QR flag.
    #[must_use]
    pub fn from_show_qr(show_qr: bool) -> Self {
        if show_qr {
            Self::Other
        } else {
            Self::ThisDevice
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nordid_rp::ErrorCode;

    fn order() -> OrderResponse {
        OrderResponse {
            order_ref: "order-1".into(),
            auto_start_token: "ast".to_string(),
            qr_start_token: "qst".to_string(),
            qr_start_secret: "qss".to_string(),
        }
    }

    #[test]
    fn test_hard_expiry_boundary_is_inclusive() {
        let started_at = Utc::now();
        let data = OrderSessionData::from_order(&order(), Operation::Auth, None, false, started_at);

        assert!(!data.is_hard_expired(started_at + Duration::seconds(179)));
        assert!(data.is_hard_expired(started_at + Duration::minutes(3)));
        assert!(data.is_hard_expired(started_at + Duration::minutes(5)));
    }

    #[test]
    fn test_collect_merge_sets_expired_on_dead_order() {
        let data = OrderSessionData::from_order(&order(), Operation::Auth, None, false, Utc::now());
        let merged = data.with_collect(&CollectResponse::failed(
            "order-1".into(),
            ErrorCode::ExpiredTransaction,
        ));
        assert!(merged.expired);

        let merged = merged.with_collect(&CollectResponse::failed(
            "order-1".into(),
            ErrorCode::UserCancel,
        ));
        assert!(!merged.expired);
    }

    #[test]
    fn test_device_selection_from_qr_flag() {
        assert_eq!(
            PreviousDeviceSelection::from_show_qr(true),
            PreviousDeviceSelection::Other
        );
        assert_eq!(
            PreviousDeviceSelection::from_show_qr(false),
            PreviousDeviceSelection::ThisDevice
        );
    }
}
