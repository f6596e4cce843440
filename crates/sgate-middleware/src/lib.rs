//! # sgate-middleware — Request Validation Middleware
//!
//! Validates named parts of incoming requests (body, query, params,
//! headers, ...) against JSON schemas and reports every failing part in one
//! structured error.
//!
//! ## Flow
//!
//! ```text
//! ValidationConfig ──Validator::validate──▶ RequestValidator ──check(request)──▶ Outcome
//!   attr → schema       (literal schemas         (shared, immutable)            Pass | Reject(ValidationError)
//!   attr → fn(req)       compiled here)
//! ```
//!
//! - Literal schemas compile once, when the middleware is built. A malformed
//!   schema fails registration, never a request.
//! - Request-derived schemas are computed and compiled on every request, so
//!   two requests can be held to different schemas (per-tenant rules,
//!   dynamic enums).
//! - Attributes are checked in configuration order with no short-circuit.
//!
//! ## Errors
//!
//! | Kind                          | Raised                  | Surfaces as                 |
//! |-------------------------------|-------------------------|-----------------------------|
//! | literal schema compile error  | `Validator::validate`   | `SchemaError`               |
//! | attribute fails its schema    | `RequestValidator::check` | `Outcome::Reject`         |
//! | schema fn / dynamic compile / engine failure | `RequestValidator::check` | `MiddlewareError` |
//!
//! The axum adapter in [`web`] maps these to 422 / 500 responses.

pub mod config;
pub mod error;
pub mod request;
pub mod validator;
pub mod web;

pub use config::{BoxError, SchemaFn, SchemaSource, ValidationConfig};
pub use error::{ErrorBody, ErrorCollection, ErrorDetail, MiddlewareError, ValidationError};
pub use request::RequestAttributes;
pub use validator::{CompiledEntry, Outcome, RequestValidator, Validator};
pub use web::{validation_middleware, HttpValidator, RequestView, RequestViewError};

pub use sgate_schema::{EngineOptions, SchemaDraft, SchemaEngine, SchemaError};
