//! # Request Extractors
//!
//! - [`RequestPayload`]: the decoded payload of a request. Form bodies are
//!   decoded with bracket nesting; when they yield no fields the body is
//!   decoded as JSON instead.
//! - [`Command`]: the payload bound onto a registered structure through the
//!   router's [`Binder`] and converted into a [`FromInstance`] type.
//!
//! ```ignore
//! async fn create_order(Command(order): Command<CreateOrder>) -> StatusCode {
//!     // ...
//! }
//!
//! let app = Router::new()
//!     .route("/orders", post(create_order))
//!     .with_state(Arc::new(binder));
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::{header, HeaderMap};
use commander_bind::{Binder, FromInstance};
use commander_core::Payload;

use crate::error::ApiError;

/// The decoded payload of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload(pub Payload);

/// A request payload bound onto `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command<T>(pub T);

/// Whether the request declares a URL-encoded form body. Media type
/// parameters such as `charset` are ignored.
fn declares_form_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| {
            essence
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

impl<S> FromRequest<S> for RequestPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = declares_form_body(req.headers());
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let form = if is_form {
            Payload::from_urlencoded(&body)
        } else {
            Payload::default()
        };
        let payload = Payload::from_request_body(form, &body)?;
        tracing::debug!(form = is_form, keys = payload.len(), "request payload decoded");
        Ok(Self(payload))
    }
}

impl<T, S> FromRequest<S> for Command<T>
where
    T: FromInstance,
    Arc<Binder>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let RequestPayload(payload) = RequestPayload::from_request(req, state).await?;
        let binder = Arc::<Binder>::from_ref(state);
        let value = binder.fill_typed::<T>(&payload)?;
        Ok(Self(value))
    }
}
