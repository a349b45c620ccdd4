//! Session persistence, concurrency and domain events for nordid.
//!
//! One [`OrderSessionData`] record tracks one active authentication or
//! signing attempt, keyed by the caller's [`nordid_core::SessionId`]. All
//! mutation flows through the five [`SessionEvent`] kinds: the
//! orchestrator publishes, the [`SessionDataListener`] applies, and the
//! publisher only returns once the store reflects the event, so a client
//! re-polling immediately after a response never reads stale state.
//!
//! The [`TryLockRepository`] lease guarantees at-most-one in-flight
//! provider call per session across concurrent polls.

pub mod dao;
pub mod data;
pub mod error;
pub mod events;
pub mod listener;
pub mod lock;
pub mod memory;
pub mod postgres;

pub use dao::SessionDao;
pub use data::{OrderSessionData, PreviousDeviceSelection};
pub use error::SessionError;
pub use events::{SessionEvent, SessionEventPublisher};
pub use listener::SessionDataListener;
pub use lock::{poll_lock_key, Lock, TryLockRepository};
pub use memory::{InMemorySessionDao, InMemoryTryLockRepository};
pub use postgres::{PgSessionDao, PgTryLockRepository};
