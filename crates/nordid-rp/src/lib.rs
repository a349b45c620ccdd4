//! Relying-party client for the remote authenticator.
//!
//! This crate owns the boundary to the authenticator's HTTP API:
//! order initiation (authenticate/sign), collect polling, cancellation,
//! and the QR payload generator used for the device-switch flow.
//!
//! The [`RpClient`] trait is the seam the orchestrator depends on; the
//! [`HttpRpClient`] implementation talks JSON over HTTPS. Provider-level
//! failures (the authenticator answered with an error document) are kept
//! distinct from transport failures so the caller can classify them.

pub mod client;
pub mod error;
pub mod qr;
pub mod types;

pub use client::{HttpRpClient, RpClient};
pub use error::RpError;
pub use qr::{QrData, QrGenerator, StartTokenQrGenerator};
pub use types::{
    AuthenticateRequest, CollectResponse, CollectStatus, ErrorCode, Operation, OrderResponse,
    ProgressStatus, SignRequest,
};
