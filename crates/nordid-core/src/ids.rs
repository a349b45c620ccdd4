//! Strongly typed identifiers
//!
//! Newtype identifiers used across nordid. Using distinct types prevents
//! accidental misuse of different ID kinds at compile time: a `SessionId`
//! (the caller's logical session) can never be passed where an `OrderRef`
//! (the authenticator's order handle) is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Error type for ID parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The underlying parse error message.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Strongly typed identifier for a logical authentication session.
///
/// One `SessionId` identifies one browser-initiated authentication or
/// signing attempt across all of its poll requests.
///
/// # Example
///
/// ```
/// use nordid_core::SessionId;
///
/// let id = SessionId::new();
/// let parsed: SessionId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random ID using UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an ID from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns a reference to the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|e| ParseIdError {
            id_type: "SessionId",
            message: e.to_string(),
        })
    }
}

/// Opaque order reference issued by the authenticator.
///
/// The authenticator owns the format; nordid only ever passes it back on
/// collect and cancel calls, so it is kept as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderRef(String);

impl OrderRef {
    /// Wraps a raw order reference received from the authenticator.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderRef {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for OrderRef {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod session_id_tests {
        use super::*;

        #[test]
        fn test_new_creates_valid_id() {
            let id = SessionId::new();
            let id_str = id.to_string();
            // UUID format: 8-4-4-4-12 hex digits
            assert_eq!(id_str.len(), 36);
            assert!(id_str.contains('-'));
        }

        #[test]
        fn test_from_uuid_preserves_value() {
            let uuid = Uuid::new_v4();
            let id = SessionId::from_uuid(uuid);
            assert_eq!(id.as_uuid(), &uuid);
        }

        #[test]
        fn test_parse_invalid_uuid_returns_error() {
            let result: std::result::Result<SessionId, _> = "not-a-uuid".parse();
            let err = result.unwrap_err();
            assert_eq!(err.id_type, "SessionId");
            assert!(!err.message.is_empty());
        }

        #[test]
        fn test_serializes_as_plain_string() {
            let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
            let id = SessionId::from_uuid(uuid);
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        }
    }

    mod order_ref_tests {
        use super::*;

        #[test]
        fn test_round_trips_raw_value() {
            let order_ref = OrderRef::new("131daac9-16c6-4618-beb0-365768f37288");
            assert_eq!(order_ref.as_str(), "131daac9-16c6-4618-beb0-365768f37288");
        }

        #[test]
        fn test_serde_roundtrip() {
            let original = OrderRef::new("abc-123");
            let json = serde_json::to_string(&original).unwrap();
            assert_eq!(json, "\"abc-123\"");
            let restored: OrderRef = serde_json::from_str(&json).unwrap();
            assert_eq!(original, restored);
        }

        #[test]
        fn test_can_use_as_hashmap_key() {
            use std::collections::HashMap;
            let mut map: HashMap<OrderRef, u32> = HashMap::new();
            map.insert(OrderRef::new("a"), 1);
            assert_eq!(map.get(&OrderRef::new("a")), Some(&1));
        }
    }
}
