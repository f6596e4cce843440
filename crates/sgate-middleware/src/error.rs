//! # Error Types
//!
//! [`ValidationError`] is the failure signal the middleware forwards when
//! one or more attributes fail their schema. It is distinguishable from
//! every other error by its fixed [`ValidationError::NAME`] and carries the
//! per-attribute violation lists and nothing else.
//!
//! [`MiddlewareError`] covers everything that is *not* a validation result:
//! schema functions that fail, request-derived schemas that do not compile,
//! and engine failures. These are never folded into the error collection.
//!
//! Both implement `IntoResponse` so the axum adapter can hand them to the
//! host as structured JSON bodies. Internal details are never exposed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use sgate_schema::{SchemaError, ValidationViolations};
use thiserror::Error;

use crate::config::BoxError;

/// Per-request map from attribute name to that attribute's violations.
///
/// Entries keep the order attributes were validated in. Empty means the
/// request is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    entries: Vec<(String, ValidationViolations)>,
}

impl ErrorCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the violations for `attribute`, replacing any earlier entry.
    pub fn insert(&mut self, attribute: impl Into<String>, violations: ValidationViolations) {
        let attribute = attribute.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, existing)) => *existing = violations,
            None => self.entries.push((attribute, violations)),
        }
    }

    /// Violations recorded for `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&ValidationViolations> {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, violations)| violations)
    }

    /// Failing attribute names, in validation order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(attribute, violations)` pairs in validation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationViolations)> {
        self.entries
            .iter()
            .map(|(name, violations)| (name.as_str(), violations))
    }

    /// Returns the number of failing attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no attribute failed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ErrorCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (attribute, violations) in &self.entries {
            map.serialize_entry(attribute, violations)?;
        }
        map.end()
    }
}

/// Aggregated schema-validation failure for one request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("JsonSchemaValidationError")]
pub struct ValidationError {
    validation_errors: ErrorCollection,
}

impl ValidationError {
    /// Discriminator carried by every validation failure.
    pub const NAME: &'static str = "JsonSchemaValidationError";

    /// Wrap a non-empty error collection.
    pub fn new(validation_errors: ErrorCollection) -> Self {
        Self { validation_errors }
    }

    /// Returns [`Self::NAME`].
    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// The per-attribute violation lists.
    pub fn validation_errors(&self) -> &ErrorCollection {
        &self.validation_errors
    }

    /// Consumes self and returns the error collection.
    pub fn into_validation_errors(self) -> ErrorCollection {
        self.validation_errors
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("name", Self::NAME)?;
        state.serialize_field("validation_errors", &self.validation_errors)?;
        state.end()
    }
}

/// Errors the middleware does not recover from. They propagate to the host
/// unchanged and are never reported as validation failures.
#[derive(Error, Debug)]
pub enum MiddlewareError {
    /// A request-derived schema function failed.
    #[error("schema function for '{attribute}' failed: {source}")]
    SchemaFunction {
        /// Attribute whose schema function failed.
        attribute: String,
        /// Error returned by the schema function.
        #[source]
        source: BoxError,
    },

    /// A request-derived schema did not compile.
    #[error("schema for '{attribute}' did not compile: {source}")]
    Compile {
        /// Attribute whose schema failed to compile.
        attribute: String,
        /// Compile error from the engine.
        #[source]
        source: SchemaError,
    },

    /// The engine failed for a reason other than an invalid value.
    #[error("engine failed validating '{attribute}': {reason}")]
    Engine {
        /// Attribute being validated.
        attribute: String,
        /// Engine-provided description.
        reason: String,
    },
}

impl MiddlewareError {
    /// The attribute being processed when the error occurred.
    pub fn attribute(&self) -> &str {
        match self {
            Self::SchemaFunction { attribute, .. }
            | Self::Compile { attribute, .. }
            | Self::Engine { attribute, .. } => attribute,
        }
    }
}

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn response(
        status: StatusCode,
        code: &str,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// 422 with the aggregated failure under `details`. The error itself is
/// also stored in the response extensions for outer layers to re-map.
impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let details = serde_json::to_value(&self).ok();
        let mut response = ErrorBody::response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            "request validation failed",
            details,
        );
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for MiddlewareError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, attribute = self.attribute(), "request validation aborted");
        ErrorBody::response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use sgate_schema::Violation;

    fn violations(message: &str) -> ValidationViolations {
        ValidationViolations::new(vec![Violation::new("", "/required", message)])
    }

    fn sample() -> ValidationError {
        let mut collection = ErrorCollection::new();
        collection.insert("body", violations(r#""id" is a required property"#));
        collection.insert("query", violations(r#""page" is a required property"#));
        ValidationError::new(collection)
    }

    async fn response_parts(response: Response) -> (StatusCode, ErrorBody) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn collection_keeps_order_and_replaces() {
        let mut collection = ErrorCollection::new();
        collection.insert("query", violations("a"));
        collection.insert("body", violations("b"));
        collection.insert("query", violations("c"));
        let attrs: Vec<&str> = collection.attributes().collect();
        assert_eq!(attrs, ["query", "body"]);
        assert_eq!(collection.get("query").unwrap().violations()[0].message, "c");
    }

    #[test]
    fn validation_error_serializes_with_discriminator() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["name"], "JsonSchemaValidationError");
        assert_eq!(json["validation_errors"]["body"][0]["keyword"], "required");
        let keys: Vec<&String> = json["validation_errors"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["body", "query"]);
    }

    #[test]
    fn validation_error_hands_back_its_collection() {
        let collection = sample().into_validation_errors();
        let pairs: Vec<(&str, usize)> = collection.iter().map(|(a, v)| (a, v.len())).collect();
        assert_eq!(pairs, [("body", 1), ("query", 1)]);
    }

    #[test]
    fn validation_error_display_is_discriminator_only() {
        assert_eq!(sample().to_string(), ValidationError::NAME);
        assert_eq!(sample().name(), "JsonSchemaValidationError");
    }

    #[test]
    fn middleware_error_attribute() {
        let err = MiddlewareError::Engine {
            attribute: "headers".into(),
            reason: "boom".into(),
        };
        assert_eq!(err.attribute(), "headers");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn schema_function_error_keeps_source() {
        use std::error::Error as _;
        let err = MiddlewareError::SchemaFunction {
            attribute: "body".into(),
            source: "unknown tenant".into(),
        };
        assert_eq!(err.source().unwrap().to_string(), "unknown tenant");
    }

    #[tokio::test]
    async fn validation_error_into_response() {
        let response = sample().into_response();
        assert_eq!(
            response.extensions().get::<ValidationError>(),
            Some(&sample())
        );
        let (status, body) = response_parts(response).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        let details = body.error.details.unwrap();
        assert_eq!(details["name"], "JsonSchemaValidationError");
        assert!(details["validation_errors"]["query"].is_array());
    }

    #[tokio::test]
    async fn middleware_error_into_response_hides_details() {
        let err = MiddlewareError::SchemaFunction {
            attribute: "body".into(),
            source: "tenant table unavailable".into(),
        };
        let (status, body) = response_parts(err.into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("tenant table"));
        assert!(body.error.details.is_none());
    }
}
