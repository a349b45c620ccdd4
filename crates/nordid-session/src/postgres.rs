//! Postgres-backed store implementations.
//!
//! The session record is one JSONB row with a TTL column; the lock is a
//! row whose insertion doubles as the atomic acquisition (conditional
//! `INSERT ... ON CONFLICT` takes over lapsed leases only). Any
//! key-value store with an atomic conditional set and TTL satisfies the
//! same contracts.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use nordid_core::SessionId;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::dao::SessionDao;
use crate::data::{OrderSessionData, PreviousDeviceSelection};
use crate::error::SessionError;
use crate::lock::{Lock, TryLockRepository, DEFAULT_LEASE_TTL};

/// Session record TTL. Must exceed the hard expiry window plus margin so
/// a session can always be observed expiring before the row vanishes.
const SESSION_TTL_MINUTES: i64 = 10;

/// Runs the schema migrations for the session tables.
pub async fn migrate(pool: &PgPool) -> Result<(), SessionError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| SessionError::store(e))
}

/// Postgres [`SessionDao`].
#[derive(Clone)]
pub struct PgSessionDao {
    pool: PgPool,
}

impl PgSessionDao {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionDao for PgSessionDao {
    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn load(&self, session_id: &SessionId) -> Result<Option<OrderSessionData>, SessionError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r"
            SELECT data FROM order_sessions
            WHERE session_id = $1 AND expires_at > now()
            ",
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(data,)| {
            serde_json::from_value(data).map_err(|e| SessionError::Corrupt {
                key: session_id.to_string(),
                cause: e.to_string(),
            })
        })
        .transpose()
    }

    #[instrument(skip(self, data), fields(session_id = %session_id, order_ref = %data.order_ref))]
    async fn save(
        &self,
        session_id: &SessionId,
        data: &OrderSessionData,
    ) -> Result<(), SessionError> {
        let json = serde_json::to_value(data).map_err(|e| SessionError::store(e))?;
        let expires_at = Utc::now() + Duration::minutes(SESSION_TTL_MINUTES);

        sqlx::query(
            r"
            INSERT INTO order_sessions (session_id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id)
            DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            ",
        )
        .bind(session_id.as_uuid())
        .bind(json)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM order_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn load_device_selection(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<PreviousDeviceSelection>, SessionError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT selection FROM previous_device_selections WHERE session_id = $1",
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(selection,)| {
            serde_json::from_value(serde_json::Value::String(selection)).map_err(|e| {
                SessionError::Corrupt {
                    key: session_id.to_string(),
                    cause: e.to_string(),
                }
            })
        })
        .transpose()
    }

    async fn save_device_selection(
        &self,
        session_id: &SessionId,
        selection: PreviousDeviceSelection,
    ) -> Result<(), SessionError> {
        let value = match selection {
            PreviousDeviceSelection::ThisDevice => "this-device",
            PreviousDeviceSelection::Other => "other",
        };

        sqlx::query(
            r"
            INSERT INTO previous_device_selections (session_id, selection)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO UPDATE SET selection = EXCLUDED.selection
            ",
        )
        .bind(session_id.as_uuid())
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Postgres [`TryLockRepository`].
///
/// Acquisition is a single conditional insert, so two concurrent callers
/// can never both obtain a live lease for the same key.
#[derive(Clone)]
pub struct PgTryLockRepository {
    pool: PgPool,
    ttl: std::time::Duration,
}

impl PgTryLockRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ttl: DEFAULT_LEASE_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(pool: PgPool, ttl: std::time::Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl TryLockRepository for PgTryLockRepository {
    #[instrument(skip(self))]
    async fn try_lock(&self, key: &str) -> Result<Option<Lock>, SessionError> {
        let token = Uuid::new_v4();
        let acquired_at = Utc::now();
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(10);
        let expires_at = acquired_at + Duration::seconds(ttl_secs);

        // Takes a fresh key, or a lapsed lease, never a live one.
        let result = sqlx::query(
            r"
            INSERT INTO session_locks (lock_key, holder, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (lock_key)
            DO UPDATE SET holder = EXCLUDED.holder, expires_at = EXCLUDED.expires_at
            WHERE session_locks.expires_at <= now()
            ",
        )
        .bind(key)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Lock {
            key: key.to_string(),
            token,
            acquired_at,
            ttl: self.ttl,
        }))
    }

    #[instrument(skip(self, lock), fields(key = %lock.key))]
    async fn release(&self, lock: &Lock) -> Result<(), SessionError> {
        // Only the matching holder deletes; stale releases are no-ops.
        sqlx::query("DELETE FROM session_locks WHERE lock_key = $1 AND holder = $2")
            .bind(&lock.key)
            .bind(lock.token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
