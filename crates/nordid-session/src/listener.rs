//! Canonical event handlers.
//!
//! Exactly one handler per event kind; together they own every mutation
//! of the session store. Handlers are idempotent: a re-delivered event
//! (for instance after a retried publish) leaves the stored state
//! unchanged, because deletes ignore absent keys and saves are plain
//! overwrites.

use chrono::Utc;
use nordid_core::SessionId;
use nordid_rp::{CollectResponse, Operation, OrderResponse};
use std::sync::Arc;
use tracing::info;

use crate::dao::SessionDao;
use crate::data::{OrderSessionData, PreviousDeviceSelection};
use crate::error::SessionError;
use crate::events::SessionEvent;

/// Applies session events to the store.
pub struct SessionDataListener {
    dao: Arc<dyn SessionDao>,
}

impl SessionDataListener {
    #[must_use]
    pub fn new(dao: Arc<dyn SessionDao>) -> Self {
        Self { dao }
    }

    /// Routes an event to its handler.
    pub async fn handle(&self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::OrderInitiated {
                session_id,
                order,
                operation,
                personal_number,
                show_qr,
            } => {
                self.on_order_initiated(session_id, &order, operation, personal_number, show_qr)
                    .await
            }
            SessionEvent::CollectObserved {
                session_id,
                collect,
            } => self.on_collect_observed(session_id, &collect).await,
            SessionEvent::OrderCompleted { session_id } => self.on_completion(session_id).await,
            SessionEvent::OrderCancelled { session_id } => self.on_cancellation(session_id).await,
            SessionEvent::Abort { session_id } => self.on_abort(session_id).await,
        }
    }

    /// Saves the new order, preserving `started_at` when the order
    /// replaces an expired one for the same session.
    async fn on_order_initiated(
        &self,
        session_id: SessionId,
        order: &OrderResponse,
        operation: Operation,
        personal_number: Option<String>,
        show_qr: bool,
    ) -> Result<(), SessionError> {
        let started_at = match self.dao.load(&session_id).await? {
            Some(previous) => previous.started_at,
            None => Utc::now(),
        };

        let data =
            OrderSessionData::from_order(order, operation, personal_number, show_qr, started_at);
        info!(session_id = %session_id, order_ref = %data.order_ref, "order initiated");
        self.dao.save(&session_id, &data).await
    }

    /// Merges the collect snapshot into the stored session. A snapshot
    /// for an already retired session is dropped.
    async fn on_collect_observed(
        &self,
        session_id: SessionId,
        collect: &CollectResponse,
    ) -> Result<(), SessionError> {
        let Some(previous) = self.dao.load(&session_id).await? else {
            return Ok(());
        };
        let merged = previous.with_collect(collect);
        self.dao.save(&session_id, &merged).await
    }

    /// Records the device preference for future attempts, then retires
    /// the session.
    async fn on_completion(&self, session_id: SessionId) -> Result<(), SessionError> {
        if let Some(data) = self.dao.load(&session_id).await? {
            let selection = PreviousDeviceSelection::from_show_qr(data.show_qr);
            self.dao
                .save_device_selection(&session_id, selection)
                .await?;
            info!(session_id = %session_id, ?selection, "order completed");
        }
        self.dao.delete(&session_id).await
    }

    async fn on_cancellation(&self, session_id: SessionId) -> Result<(), SessionError> {
        info!(session_id = %session_id, "order cancelled");
        self.dao.delete(&session_id).await
    }

    async fn on_abort(&self, session_id: SessionId) -> Result<(), SessionError> {
        self.dao.delete(&session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionEventPublisher;
    use crate::memory::InMemorySessionDao;
    use chrono::Duration;
    use nordid_rp::{CollectStatus, ErrorCode, ProgressStatus};

    fn order(order_ref: &str) -> OrderResponse {
        OrderResponse {
            order_ref: order_ref.into(),
            auto_start_token: "ast".to_string(),
            qr_start_token: "qst".to_string(),
            qr_start_secret: "qss".to_string(),
        }
    }

    fn pending(order_ref: &str, hint: ProgressStatus) -> CollectResponse {
        CollectResponse {
            order_ref: order_ref.into(),
            status: CollectStatus::Pending,
            progress_status: Some(hint),
            error_code: None,
            completion_data: None,
        }
    }

    fn fixture() -> (Arc<InMemorySessionDao>, SessionEventPublisher) {
        let dao = Arc::new(InMemorySessionDao::new());
        let listener = Arc::new(SessionDataListener::new(dao.clone()));
        (dao, SessionEventPublisher::new(listener))
    }

    #[tokio::test]
    async fn test_order_initiated_saves_fresh_session() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Auth,
                personal_number: None,
                show_qr: true,
            })
            .await
            .unwrap();

        let data = dao.load(&id).await.unwrap().unwrap();
        assert_eq!(data.order_ref.as_str(), "order-1");
        assert!(data.show_qr);
        assert!(!data.expired);
        assert!(data.last_status.is_none());
    }

    #[tokio::test]
    async fn test_replacement_order_preserves_started_at() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Sign,
                personal_number: Some("190001019876".to_string()),
                show_qr: false,
            })
            .await
            .unwrap();

        // Backdate the original order and mark it expired.
        let mut stored = dao.load(&id).await.unwrap().unwrap();
        stored.started_at = stored.started_at - Duration::minutes(2);
        stored.expired = true;
        let original_start = stored.started_at;
        dao.save(&id, &stored).await.unwrap();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-2"),
                operation: Operation::Sign,
                personal_number: Some("190001019876".to_string()),
                show_qr: false,
            })
            .await
            .unwrap();

        let replaced = dao.load(&id).await.unwrap().unwrap();
        assert_eq!(replaced.order_ref.as_str(), "order-2");
        assert_eq!(replaced.started_at, original_start);
        assert!(!replaced.expired);
    }

    #[tokio::test]
    async fn test_collect_observed_redelivery_is_idempotent() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Auth,
                personal_number: None,
                show_qr: false,
            })
            .await
            .unwrap();

        let snapshot = pending("order-1", ProgressStatus::UserSign);
        for _ in 0..2 {
            publisher
                .publish(SessionEvent::CollectObserved {
                    session_id: id,
                    collect: snapshot.clone(),
                })
                .await
                .unwrap();
        }

        let data = dao.load(&id).await.unwrap().unwrap();
        assert_eq!(
            data.last_status.unwrap().progress_status,
            Some(ProgressStatus::UserSign)
        );
    }

    #[tokio::test]
    async fn test_collect_for_retired_session_is_dropped() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::CollectObserved {
                session_id: id,
                collect: pending("order-1", ProgressStatus::Started),
            })
            .await
            .unwrap();

        assert!(dao.load(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collect_with_expired_transaction_flags_session() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Auth,
                personal_number: None,
                show_qr: false,
            })
            .await
            .unwrap();

        publisher
            .publish(SessionEvent::CollectObserved {
                session_id: id,
                collect: CollectResponse::failed("order-1".into(), ErrorCode::ExpiredTransaction),
            })
            .await
            .unwrap();

        assert!(dao.load(&id).await.unwrap().unwrap().expired);
    }

    #[tokio::test]
    async fn test_completion_records_device_and_redelivery_is_harmless() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Auth,
                personal_number: None,
                show_qr: true,
            })
            .await
            .unwrap();

        for _ in 0..2 {
            publisher
                .publish(SessionEvent::OrderCompleted { session_id: id })
                .await
                .unwrap();
        }

        assert!(dao.load(&id).await.unwrap().is_none());
        assert_eq!(
            dao.load_device_selection(&id).await.unwrap(),
            Some(PreviousDeviceSelection::Other)
        );
    }

    #[tokio::test]
    async fn test_cancellation_and_abort_delete_state() {
        let (dao, publisher) = fixture();
        let id = SessionId::new();

        publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: id,
                order: order("order-1"),
                operation: Operation::Auth,
                personal_number: None,
                show_qr: false,
            })
            .await
            .unwrap();

        publisher
            .publish(SessionEvent::OrderCancelled { session_id: id })
            .await
            .unwrap();
        assert!(dao.load(&id).await.unwrap().is_none());

        // Re-delivery on an already retired session.
        publisher
            .publish(SessionEvent::OrderCancelled { session_id: id })
            .await
            .unwrap();
        publisher
            .publish(SessionEvent::Abort { session_id: id })
            .await
            .unwrap();
    }
}
