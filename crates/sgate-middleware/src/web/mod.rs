//! # axum Adapter
//!
//! Host integration for axum: [`RequestView`] exposes an HTTP request as
//! validation attributes and [`validation_middleware`] runs a
//! [`RequestValidator`](crate::RequestValidator) in front of routes.

pub mod layer;
pub mod view;

pub use layer::{validation_middleware, HttpValidator};
pub use view::{RequestView, RequestViewError, DEFAULT_BODY_LIMIT};
