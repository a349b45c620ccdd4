//! Session store boundary.

use async_trait::async_trait;
use nordid_core::SessionId;

use crate::data::{OrderSessionData, PreviousDeviceSelection};
use crate::error::SessionError;

/// Key-value persistence of per-session order state.
///
/// The store owns no logic: all mutation is driven by the event handlers
/// in [`crate::listener`]. Implementations must make `delete` a no-op on
/// absent keys and `save` a plain overwrite, so re-delivered events leave
/// the state unchanged.
#[async_trait]
pub trait SessionDao: Send + Sync {
    /// Loads the order state for a session, if an attempt is in progress.
    async fn load(&self, session_id: &SessionId) -> Result<Option<OrderSessionData>, SessionError>;

    /// Saves (creates or replaces) the order state for a session.
    async fn save(
        &self,
        session_id: &SessionId,
        data: &OrderSessionData,
    ) -> Result<(), SessionError>;

    /// Deletes the order state for a session. Absent keys are a no-op.
    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionError>;

    /// Loads the device selection recorded by the session's last
    /// completed order.
    async fn load_device_selection(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<PreviousDeviceSelection>, SessionError>;

    /// Records the device selection for future attempts.
    async fn save_device_selection(
        &self,
        session_id: &SessionId,
        selection: PreviousDeviceSelection,
    ) -> Result<(), SessionError>;
}
