//! In-memory store implementations.
//!
//! Single-process backing for development and tests. The durable
//! equivalents live in [`crate::postgres`].

use async_trait::async_trait;
use chrono::Utc;
use nordid_core::SessionId;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dao::SessionDao;
use crate::data::{OrderSessionData, PreviousDeviceSelection};
use crate::error::SessionError;
use crate::lock::{Lock, TryLockRepository, DEFAULT_LEASE_TTL};

/// In-memory [`SessionDao`].
#[derive(Default)]
pub struct InMemorySessionDao {
    sessions: RwLock<HashMap<SessionId, OrderSessionData>>,
    device_selections: RwLock<HashMap<SessionId, PreviousDeviceSelection>>,
}

impl InMemorySessionDao {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionDao for InMemorySessionDao {
    async fn load(&self, session_id: &SessionId) -> Result<Option<OrderSessionData>, SessionError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(
        &self,
        session_id: &SessionId,
        data: &OrderSessionData,
    ) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(*session_id, data.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn load_device_selection(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<PreviousDeviceSelection>, SessionError> {
        Ok(self
            .device_selections
            .read()
            .await
            .get(session_id)
            .copied())
    }

    async fn save_device_selection(
        &self,
        session_id: &SessionId,
        selection: PreviousDeviceSelection,
    ) -> Result<(), SessionError> {
        self.device_selections
            .write()
            .await
            .insert(*session_id, selection);
        Ok(())
    }
}

/// In-memory [`TryLockRepository`] with lease expiry.
pub struct InMemoryTryLockRepository {
    ttl: Duration,
    leases: Mutex<HashMap<String, (Uuid, Instant)>>,
}

impl InMemoryTryLockRepository {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            leases: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTryLockRepository {
    fn default() -> Self {
        Self::new(DEFAULT_LEASE_TTL)
    }
}

#[async_trait]
impl TryLockRepository for InMemoryTryLockRepository {
    async fn try_lock(&self, key: &str) -> Result<Option<Lock>, SessionError> {
        let mut leases = self.leases.lock().await;
        let now = Instant::now();

        if let Some((_, taken_at)) = leases.get(key) {
            if now.duration_since(*taken_at) < self.ttl {
                return Ok(None);
            }
            // Lapsed lease from a crashed holder; take it over.
        }

        let token = Uuid::new_v4();
        leases.insert(key.to_string(), (token, now));
        Ok(Some(Lock {
            key: key.to_string(),
            token,
            acquired_at: Utc::now(),
            ttl: self.ttl,
        }))
    }

    async fn release(&self, lock: &Lock) -> Result<(), SessionError> {
        let mut leases = self.leases.lock().await;
        if leases.get(&lock.key).is_some_and(|(t, _)| *t == lock.token) {
            leases.remove(&lock.key);
        }
        Ok(())
    }
}
