//! Poll orchestration and HTTP API for nordid.
//!
//! This crate carries the order-polling state machine: the
//! [`BankIdService`] decides on every poll whether to start an order,
//! collect the current one, silently replace an expired one, or report
//! hard expiry, while the try-lock keeps concurrent polls for the same
//! session from issuing duplicate provider calls.
//!
//! Endpoints:
//! - `POST /api/poll` - start/advance the order for the caller's session
//! - `POST /api/cancel` - cancel the current order
//! - `GET /api/device` - previously used device selection

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::{ApiError, ErrorResponse};
pub use models::{ApiResponse, PollStatus, QrMaterial, ResolvedStatus};
pub use router::api_router;
pub use services::bankid_service::{BankIdService, PollRequest};
pub use services::status_code::resolve;
