//! Router configuration for the poll API.

use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use nordid_rp::QrGenerator;

use crate::handlers::{cancel_handler, device_handler, poll_handler};
use crate::services::BankIdService;

/// Builds the `/api` router with its service extensions attached.
pub fn api_router(service: Arc<BankIdService>, qr_generator: Arc<dyn QrGenerator>) -> Router {
    Router::new()
        .route("/api/poll", post(poll_handler))
        .route("/api/cancel", post(cancel_handler))
        .route("/api/device", get(device_handler))
        .layer(Extension(service))
        .layer(Extension(qr_generator))
}
