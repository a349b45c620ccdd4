//! Domain events describing poll outcomes.
//!
//! The orchestrator publishes; the canonical handler in
//! [`crate::listener`] applies the mutation. Dispatch is synchronous:
//! [`SessionEventPublisher::publish`] returns only after the store
//! reflects the event, preserving the handler-before-response ordering
//! guarantee the poll loop depends on.

use nordid_core::SessionId;
use nordid_rp::{CollectResponse, Operation, OrderResponse};
use std::sync::Arc;
use tracing::debug;

use crate::error::SessionError;
use crate::listener::SessionDataListener;

/// The five event kinds that drive session mutation.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new order (fresh or replacement) was accepted by the provider.
    OrderInitiated {
        session_id: SessionId,
        order: OrderResponse,
        operation: Operation,
        personal_number: Option<String>,
        show_qr: bool,
    },
    /// A collect snapshot was observed for the session's current order.
    CollectObserved {
        session_id: SessionId,
        collect: CollectResponse,
    },
    /// The order finished successfully; the session is retired.
    OrderCompleted { session_id: SessionId },
    /// The caller cancelled, or the order hard-expired; the session is
    /// retired.
    OrderCancelled { session_id: SessionId },
    /// Failure path that must not retain partial state.
    Abort { session_id: SessionId },
}

impl SessionEvent {
    /// Event kind name, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::OrderInitiated { .. } => "order-initiated",
            SessionEvent::CollectObserved { .. } => "collect-observed",
            SessionEvent::OrderCompleted { .. } => "order-completed",
            SessionEvent::OrderCancelled { .. } => "order-cancelled",
            SessionEvent::Abort { .. } => "abort",
        }
    }

    /// The session the event belongs to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            SessionEvent::OrderInitiated { session_id, .. }
            | SessionEvent::CollectObserved { session_id, .. }
            | SessionEvent::OrderCompleted { session_id }
            | SessionEvent::OrderCancelled { session_id }
            | SessionEvent::Abort { session_id } => session_id,
        }
    }
}

/// Publishes session events to their canonical handler.
#[derive(Clone)]
pub struct SessionEventPublisher {
    listener: Arc<SessionDataListener>,
}

impl SessionEventPublisher {
    #[must_use]
    pub fn new(listener: Arc<SessionDataListener>) -> Self {
        Self { listener }
    }

    /// Dispatches the event and waits for the handler to persist it.
    pub async fn publish(&self, event: SessionEvent) -> Result<(), SessionError> {
        debug!(kind = event.kind(), session_id = %event.session_id(), "publishing session event");
        self.listener.handle(event).await
    }
}
