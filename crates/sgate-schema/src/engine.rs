//! # Engine Contract
//!
//! The two traits an engine implements and the two error types that cross
//! the boundary.
//!
//! Engines may signal a failed check either by returning a negative result
//! together with an error list, or by raising a validation error that
//! carries the list. Both shapes collapse into [`EngineError::Invalid`] here,
//! so callers only ever match on one variant to decide whether a failure is
//! a validation result.
//!
//! Both `compile` and `validate` are async so an engine can reach out to
//! I/O (a schema registry, a database lookup behind a custom keyword)
//! without blocking the runtime. Engines with nothing to wait on simply
//! return.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::violation::ValidationViolations;

/// Compiles schema values into reusable validators.
///
/// Implementations must be shareable across requests without locking:
/// `compile` takes `&self` and the returned validators are `Send + Sync`.
#[async_trait]
pub trait SchemaEngine: Send + Sync + fmt::Debug {
    /// Compile a schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] if the schema is malformed.
    async fn compile(&self, schema: &Value) -> Result<Arc<dyn CompiledSchema>, SchemaError>;
}

/// A compiled schema, ready to check values.
#[async_trait]
pub trait CompiledSchema: Send + Sync + fmt::Debug {
    /// Check `instance` against the schema.
    ///
    /// # Errors
    ///
    /// [`EngineError::Invalid`] when the instance does not conform,
    /// [`EngineError::Internal`] for anything else.
    async fn validate(&self, instance: &Value) -> Result<(), EngineError>;
}

/// Failure reported by [`CompiledSchema::validate`].
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The instance did not conform to the schema.
    #[error("instance failed validation:\n{0}")]
    Invalid(ValidationViolations),

    /// The engine failed for a reason unrelated to the instance's validity.
    #[error("engine failure: {reason}")]
    Internal {
        /// Engine-provided description.
        reason: String,
    },
}

/// Error while loading or compiling a schema.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema could not be compiled into a validator.
    #[error("schema compile error for '{schema_name}': {reason}")]
    Compile {
        /// The schema's `$id`, or `<inline>` when it has none.
        schema_name: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// A schema file could not be loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    Load {
        /// Schema filename or directory.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// IO error reading schema files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Build a compile error, naming the schema by its `$id` when present.
    pub fn compile(schema: &Value, reason: impl Into<String>) -> Self {
        Self::Compile {
            schema_name: schema_name(schema),
            reason: reason.into(),
        }
    }
}

/// Human-readable name for a schema value: its `$id`, else `<inline>`.
pub fn schema_name(schema: &Value) -> String {
    schema
        .get("$id")
        .and_then(Value::as_str)
        .unwrap_or("<inline>")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_name_uses_id() {
        let schema = json!({"$id": "https://example.test/user.schema.json"});
        assert_eq!(schema_name(&schema), "https://example.test/user.schema.json");
    }

    #[test]
    fn schema_name_falls_back_to_inline() {
        assert_eq!(schema_name(&json!({"type": "object"})), "<inline>");
        assert_eq!(schema_name(&json!(true)), "<inline>");
    }

    #[test]
    fn compile_error_display_names_schema() {
        let err = SchemaError::compile(&json!({"$id": "tenant.json"}), "bad type");
        let msg = err.to_string();
        assert!(msg.contains("tenant.json"), "got: {msg}");
        assert!(msg.contains("bad type"), "got: {msg}");
    }

    #[test]
    fn internal_engine_error_display() {
        let err = EngineError::Internal {
            reason: "resolver crashed".into(),
        };
        assert!(err.to_string().contains("resolver crashed"));
    }
}
