//! nordid core library
//!
//! Shared types for the nordid identity provider.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`SessionId`, `OrderRef`)

pub mod ids;

pub use ids::{OrderRef, ParseIdError, SessionId};
