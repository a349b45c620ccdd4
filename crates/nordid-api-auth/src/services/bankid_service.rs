//! Poll orchestration.
//!
//! One [`BankIdService::poll`] call advances a session's order state
//! machine by exactly one step: start a fresh order, collect the current
//! one, silently replace an expired one inside the three-minute window,
//! or report hard expiry. All provider calls for a session run under a
//! non-blocking lease, so concurrent polls never issue duplicate calls;
//! a contended poll answers from the stored snapshot instead.
//!
//! Provider rejections are converted into collect-shaped failures and
//! resolved like any other snapshot. Only transport-level failures
//! surface as errors, and those leave the session untouched so the next
//! poll resumes from the last known state.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use nordid_core::{OrderRef, SessionId};
use nordid_rp::{
    AuthenticateRequest, CollectResponse, CollectStatus, ErrorCode, HttpRpClient, Operation,
    OrderResponse, RpClient, RpError, SignRequest,
};
use nordid_session::{
    poll_lock_key, OrderSessionData, PreviousDeviceSelection, SessionDao, SessionEvent,
    SessionEventPublisher, TryLockRepository,
};

use crate::error::ApiError;
use crate::models::{PollStatus, QrMaterial, ResolvedStatus};
use crate::services::status_code;

/// Context for one poll call.
#[derive(Debug, Clone)]
pub struct PollRequest {
    pub session_id: SessionId,
    /// Whether the caller polls via the QR device-switch flow. Binding
    /// for a fresh order; the stored flag wins once an order exists.
    pub show_qr: bool,
    /// Order kind for a fresh order. Ignored once an order exists.
    pub operation: Operation,
    /// Subject identifier for a fresh order.
    pub personal_number: Option<String>,
    /// IP address of the end user's browser.
    pub end_user_ip: String,
    /// Text shown to the user in the client app. Required for sign
    /// orders, optional for authentication.
    pub user_visible_data: Option<String>,
}

/// Drives the per-session order state machine.
pub struct BankIdService {
    client: Arc<dyn RpClient>,
    sessions: Arc<dyn SessionDao>,
    locks: Arc<dyn TryLockRepository>,
    publisher: SessionEventPublisher,
}

impl BankIdService {
    #[must_use]
    pub fn new(
        client: Arc<dyn RpClient>,
        sessions: Arc<dyn SessionDao>,
        locks: Arc<dyn TryLockRepository>,
        publisher: SessionEventPublisher,
    ) -> Self {
        Self {
            client,
            sessions,
            locks,
            publisher,
        }
    }

    /// Advances the session's order by one poll step.
    ///
    /// When another poll for the same session holds the lease, no
    /// provider call is made: the stored snapshot is resolved instead,
    /// or `RETRY` when nothing is stored yet.
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn poll(&self, request: &PollRequest) -> Result<ResolvedStatus, ApiError> {
        let key = poll_lock_key(&request.session_id);
        let Some(lock) = self.locks.try_lock(&key).await? else {
            info!("poll lock contended, serving stored status");
            return self.stored_status(request).await;
        };

        let result = self.poll_locked(request).await;

        // The lease lapses on its own; a failed release only delays the
        // next poll, it must not fail this one.
        if let Err(e) = self.locks.release(&lock).await {
            warn!(key = %lock.key, "failed to release poll lock: {}", e);
        }

        result
    }

    /// Cancels the session's current order.
    ///
    /// The upstream cancel call is best-effort: the order lapses on the
    /// provider side regardless, so only the local retirement matters.
    /// Idempotent; cancelling a session without an order is a no-op.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn cancel(&self, session_id: &SessionId) -> Result<(), ApiError> {
        let key = poll_lock_key(session_id);
        match self.locks.try_lock(&key).await? {
            Some(lock) => {
                if let Some(data) = self.sessions.load(session_id).await? {
                    if let Err(e) = self.client.cancel(&data.order_ref).await {
                        warn!(order_ref = %data.order_ref, "upstream cancel failed: {}", e);
                    }
                }
                if let Err(e) = self.locks.release(&lock).await {
                    warn!(key = %lock.key, "failed to release poll lock: {}", e);
                }
            }
            // An in-flight poll holds the lease. Skip the upstream call;
            // retiring the session below makes the poll's outcome moot.
            None => info!("cancel raced an in-flight poll, skipping upstream call"),
        }

        self.publisher
            .publish(SessionEvent::OrderCancelled {
                session_id: *session_id,
            })
            .await?;
        Ok(())
    }

    /// Device selection recorded by the session's last completed order.
    pub async fn previous_device(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<PreviousDeviceSelection>, ApiError> {
        Ok(self.sessions.load_device_selection(session_id).await?)
    }

    async fn poll_locked(&self, request: &PollRequest) -> Result<ResolvedStatus, ApiError> {
        match self.sessions.load(&request.session_id).await? {
            None => self.start_order(request).await,
            // The current order reference is known dead; collecting it
            // again would be a wasted call.
            Some(data) if data.expired => self.replace_or_expire(request, &data).await,
            Some(data) => self.collect_order(request, &data, true).await,
        }
    }

    /// Initiates the first order for a session.
    async fn start_order(&self, request: &PollRequest) -> Result<ResolvedStatus, ApiError> {
        let order = match self
            .initiate(request, request.operation, request.personal_number.clone())
            .await
        {
            Ok(order) => order,
            Err(e) => {
                // Nothing was stored, so a rejection resolves like a
                // failed collect and the next poll starts over.
                let snapshot = rejection_snapshot("".into(), &e)
                    .ok_or_else(|| ApiError::Provider(e.to_string()))?;
                let message_code =
                    status_code::resolve(&snapshot, request.show_qr, request.operation);
                return Ok(ResolvedStatus {
                    status: PollStatus::Failed,
                    message_code,
                    qr: None,
                    collect: Some(snapshot),
                });
            }
        };

        self.publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: request.session_id,
                order,
                operation: request.operation,
                personal_number: request.personal_number.clone(),
                show_qr: request.show_qr,
            })
            .await?;

        self.collect_stored(request).await
    }

    /// Replaces an expired order, or reports hard expiry once the
    /// session has been trying for three minutes or more.
    async fn replace_or_expire(
        &self,
        request: &PollRequest,
        data: &OrderSessionData,
    ) -> Result<ResolvedStatus, ApiError> {
        if data.is_hard_expired(Utc::now()) {
            info!(order_ref = %data.order_ref, "attempt hard-expired, retiring session");
            self.publisher
                .publish(SessionEvent::OrderCancelled {
                    session_id: request.session_id,
                })
                .await?;
            return Ok(ResolvedStatus::time_expired());
        }

        // Silent re-authentication: same operation and subject, new
        // order reference. The handler preserves the original
        // `started_at`, so the hard expiry window keeps counting.
        let order = match self
            .initiate(request, data.operation, data.personal_number.clone())
            .await
        {
            Ok(order) => order,
            Err(e) => {
                let Some(snapshot) = rejection_snapshot(data.order_ref.clone(), &e) else {
                    return Err(ApiError::Provider(e.to_string()));
                };
                // The old order is dead and no replacement exists;
                // partial state must not survive.
                self.publisher
                    .publish(SessionEvent::Abort {
                        session_id: request.session_id,
                    })
                    .await?;
                return Ok(self.resolved(data, &snapshot));
            }
        };

        info!(old = %data.order_ref, new = %order.order_ref, "replaced expired order");
        self.publisher
            .publish(SessionEvent::OrderInitiated {
                session_id: request.session_id,
                order,
                operation: data.operation,
                personal_number: data.personal_number.clone(),
                show_qr: data.show_qr,
            })
            .await?;

        self.collect_stored(request).await
    }

    /// Collects the freshly stored order. At most one replacement
    /// happens per poll, so this path never replaces again.
    async fn collect_stored(&self, request: &PollRequest) -> Result<ResolvedStatus, ApiError> {
        match self.sessions.load(&request.session_id).await? {
            Some(data) => self.collect_order(request, &data, false).await,
            // Retired concurrently between the publish and this load.
            None => Ok(ResolvedStatus::retry()),
        }
    }

    /// Collects the current order and resolves the snapshot.
    async fn collect_order(
        &self,
        request: &PollRequest,
        data: &OrderSessionData,
        allow_replace: bool,
    ) -> Result<ResolvedStatus, ApiError> {
        let snapshot = match self.client.collect(&data.order_ref).await {
            Ok(snapshot) => snapshot,
            Err(e) => rejection_snapshot(data.order_ref.clone(), &e)
                .ok_or_else(|| ApiError::Provider(e.to_string()))?,
        };

        self.publisher
            .publish(SessionEvent::CollectObserved {
                session_id: request.session_id,
                collect: snapshot.clone(),
            })
            .await?;

        if snapshot.is_order_expiry() && allow_replace {
            let merged = data.clone().with_collect(&snapshot);
            return Box::pin(self.replace_or_expire(request, &merged)).await;
        }

        if snapshot.status == CollectStatus::Complete {
            self.publisher
                .publish(SessionEvent::OrderCompleted {
                    session_id: request.session_id,
                })
                .await?;
        }

        Ok(self.resolved(data, &snapshot))
    }

    /// Resolves the stored snapshot without touching the provider.
    async fn stored_status(&self, request: &PollRequest) -> Result<ResolvedStatus, ApiError> {
        match self.sessions.load(&request.session_id).await? {
            Some(data) => match data.last_status.clone() {
                Some(snapshot) => Ok(self.resolved(&data, &snapshot)),
                None => Ok(ResolvedStatus::retry()),
            },
            None => Ok(ResolvedStatus::retry()),
        }
    }

    async fn initiate(
        &self,
        request: &PollRequest,
        operation: Operation,
        personal_number: Option<String>,
    ) -> Result<OrderResponse, RpError> {
        let user_visible_data = request
            .user_visible_data
            .as_deref()
            .map(HttpRpClient::encode_user_visible_data);

        match operation {
            Operation::Auth => {
                self.client
                    .authenticate(&AuthenticateRequest {
                        personal_number,
                        end_user_ip: request.end_user_ip.clone(),
                        user_visible_data,
                    })
                    .await
            }
            Operation::Sign => {
                self.client
                    .sign(&SignRequest {
                        personal_number,
                        end_user_ip: request.end_user_ip.clone(),
                        user_visible_data: user_visible_data.unwrap_or_default(),
                    })
                    .await
            }
        }
    }

    fn resolved(&self, data: &OrderSessionData, snapshot: &CollectResponse) -> ResolvedStatus {
        let status = ResolvedStatus::status_of(snapshot);
        let message_code = status_code::resolve(snapshot, data.show_qr, data.operation);
        let qr = (data.show_qr && status == PollStatus::InProgress).then(|| QrMaterial {
            auto_start_token: data.auto_start_token.clone(),
            qr_start_token: data.qr_start_token.clone(),
            qr_start_secret: data.qr_start_secret.clone(),
            order_started_at: data.started_at,
        });
        ResolvedStatus {
            status,
            message_code,
            qr,
            collect: Some(snapshot.clone()),
        }
    }
}

/// Converts a provider rejection into a collect-shaped failure so it can
/// flow through the ordinary resolution path. Transport failures return
/// `None`; they are errors, not statuses.
fn rejection_snapshot(order_ref: OrderRef, error: &RpError) -> Option<CollectResponse> {
    match error {
        RpError::Provider { code, .. } => Some(CollectResponse::failed(
            order_ref,
            code.unwrap_or(ErrorCode::Unknown),
        )),
        RpError::Transport { .. } | RpError::InvalidResponse { .. } => None,
    }
}
