//! # commander-api — Axum Integration
//!
//! Request extractors that decode a request body into a
//! [`Payload`](commander_core::Payload) and bind it through a shared
//! [`Binder`](commander_bind::Binder) held in router state.
//!
//! ## Status Mapping
//!
//! | Failure | Status |
//! |---------|--------|
//! | No usable payload | 400 |
//! | Unreadable body | 400 |
//! | Missing field, type mismatch, rejected value, nesting too deep | 422 |
//! | Unregistered type, failed typed conversion | 500 |
//!
//! Error bodies are `{"error": {"code", "message", "details"}}`.

pub mod error;
pub mod extract;

pub use error::{ApiError, ErrorBody, ErrorDetail};
pub use extract::{Command, RequestPayload};
