//! Orchestration services.

pub mod bankid_service;
pub mod status_code;

pub use bankid_service::{BankIdService, PollRequest};
