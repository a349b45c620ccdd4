//! Distributed try-lock boundary.
//!
//! Guarantees at-most-one concurrent in-flight provider call per session.
//! Acquisition never blocks; a contended caller serves the last stored
//! status instead of waiting. Leases carry a TTL so a crashed holder
//! cannot permanently starve a session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nordid_core::SessionId;
use std::time::Duration;
use uuid::Uuid;

use crate::error::SessionError;

/// Default lease TTL. Long enough to cover one upstream round trip,
/// short enough that a crashed holder releases the session quickly.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10);

/// Lock key covering one session's provider calls.
#[must_use]
pub fn poll_lock_key(session_id: &SessionId) -> String {
    format!("lock:session:{session_id}")
}

/// A held lease on a lock key.
///
/// Non-reentrant: acquiring the same key twice requires the first lease
/// to be released or to lapse.
#[derive(Debug, Clone)]
pub struct Lock {
    /// The locked key.
    pub key: String,
    /// Holder token; release only succeeds for the matching holder.
    pub token: Uuid,
    /// Acquisition time.
    pub acquired_at: DateTime<Utc>,
    /// Lease duration after which the lock lapses on its own.
    pub ttl: Duration,
}

/// Non-blocking, lease-based mutual exclusion keyed by string.
#[async_trait]
pub trait TryLockRepository: Send + Sync {
    /// Attempts to acquire the lock. Returns `None` immediately when the
    /// key is held by a live lease; never waits.
    async fn try_lock(&self, key: &str) -> Result<Option<Lock>, SessionError>;

    /// Releases a held lease. Idempotent: releasing a lapsed or already
    /// released lease is a no-op.
    async fn release(&self, lock: &Lock) -> Result<(), SessionError>;
}
