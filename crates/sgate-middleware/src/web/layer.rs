//! # axum Middleware
//!
//! Mount a [`RequestValidator`] in front of axum routes:
//!
//! ```ignore
//! let validator = Validator::default()
//!     .validate(ValidationConfig::new().schema("body", json!({"type": "object", "required": ["id"]})))
//!     .await?;
//! let app = Router::new()
//!     .route("/orders/{id}", post(create_order))
//!     .layer(from_fn_with_state(HttpValidator::new(validator), validation_middleware));
//! ```
//!
//! `Router::layer` wraps each route, so path parameters are already
//! captured when the middleware runs.
//!
//! The body is buffered only when the validator can read it: a configured
//! `body` entry, or any request-derived schema. Otherwise the request is
//! forwarded with its body stream untouched.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::validator::{Outcome, RequestValidator};
use crate::web::view::{RequestView, DEFAULT_BODY_LIMIT};

/// Middleware state: the compiled validator plus the body buffering limit.
#[derive(Debug, Clone)]
pub struct HttpValidator {
    validator: RequestValidator<RequestView>,
    body_limit: usize,
}

impl HttpValidator {
    /// Wrap a validator with the default body limit.
    pub fn new(validator: RequestValidator<RequestView>) -> Self {
        Self {
            validator,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Set the maximum number of body bytes buffered for validation.
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// The wrapped validator.
    pub fn validator(&self) -> &RequestValidator<RequestView> {
        &self.validator
    }

    /// The body buffering limit in bytes.
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }
}

impl From<RequestValidator<RequestView>> for HttpValidator {
    fn from(validator: RequestValidator<RequestView>) -> Self {
        Self::new(validator)
    }
}

/// Validate the request and run the inner service only if it passes.
///
/// - pass: the request, with its body intact, goes to `next`;
/// - validation failure: 422 from [`ValidationError`](crate::ValidationError);
/// - body needed for validation but unreadable or oversized: 400 / 413;
/// - any other failure: 500 with details withheld.
pub async fn validation_middleware(
    State(http): State<HttpValidator>,
    request: Request,
    next: Next,
) -> Response {
    let (view, request) = if http.validator.reads_attribute("body") {
        match RequestView::from_request(request, http.body_limit).await {
            Ok(pair) => pair,
            Err(rejection) => return rejection.into_response(),
        }
    } else {
        RequestView::from_request_head(request).await
    };

    match http.validator.check(&view).await {
        Ok(Outcome::Pass) => next.run(request).await,
        Ok(Outcome::Reject(failure)) => failure.into_response(),
        Err(err) => err.into_response(),
    }
}
