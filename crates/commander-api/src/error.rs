//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Bind failures caused by the request become 4xx responses carrying the
//! offending field path; failures caused by server configuration become
//! 500s whose details are logged but never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use commander_core::BindError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "MISSING_FIELD", "TYPE_MISMATCH").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Field path and kinds, present only for client errors about one field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error returned by the Commander extractors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Binding failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The request body could not be read (400).
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Bind(err) => match err {
                BindError::EmptyPayload => (StatusCode::BAD_REQUEST, "EMPTY_PAYLOAD"),
                BindError::MissingRequiredField { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_FIELD")
                }
                BindError::TypeMismatch { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "TYPE_MISMATCH"),
                BindError::Construction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_VALUE"),
                BindError::DepthExceeded { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "NESTING_TOO_DEEP")
                }
                BindError::UnknownType { .. } | BindError::Extraction { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        let Self::Bind(err) = self else {
            return None;
        };
        match err {
            BindError::TypeMismatch {
                field,
                expected,
                actual,
            } => Some(serde_json::json!({
                "field": field,
                "expected": expected,
                "actual": actual,
            })),
            BindError::Construction {
                field, type_name, ..
            } => Some(serde_json::json!({ "field": field, "type": type_name })),
            BindError::MissingRequiredField { field } | BindError::DepthExceeded { field, .. } => {
                Some(serde_json::json!({ "field": field }))
            }
            BindError::EmptyPayload | BindError::UnknownType { .. } | BindError::Extraction { .. } => {
                None
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let (message, details) = if status.is_server_error() {
            tracing::error!(error = %self, "internal server error");
            ("An internal error occurred".to_string(), None)
        } else {
            tracing::debug!(error = %self, code, "request rejected");
            (self.to_string(), self.details())
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}
