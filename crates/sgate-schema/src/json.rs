//! # jsonschema-backed Engine
//!
//! The default [`SchemaEngine`]. Compilation builds a `jsonschema::Validator`
//! with the configured draft and format policy and a local retriever over
//! the [`SchemaStore`]; validation collects every error the validator
//! reports, not just the first.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::{ValidationOptions, Validator};
use serde_json::Value;

use crate::engine::{CompiledSchema, EngineError, SchemaEngine, SchemaError};
use crate::options::{EngineOptions, SchemaDraft};
use crate::store::SchemaStore;
use crate::violation::{ValidationViolations, Violation};

/// Schema engine backed by the `jsonschema` crate.
///
/// `JsonSchemaEngine` is `Send + Sync`; one instance is shared by every
/// middleware built from the same factory.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaEngine {
    draft: SchemaDraft,
    validate_formats: bool,
    store: SchemaStore,
}

impl JsonSchemaEngine {
    /// Build an engine from options, loading the schema store if configured.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Load` if `schema_dir` is set and cannot be loaded.
    pub fn new(options: EngineOptions) -> Result<Self, SchemaError> {
        let store = match &options.schema_dir {
            Some(dir) => SchemaStore::load(dir)?,
            None => SchemaStore::new(),
        };
        Ok(Self {
            draft: options.draft,
            validate_formats: options.validate_formats,
            store,
        })
    }

    /// Replace the schema store used for `$ref` resolution.
    pub fn with_store(mut self, store: SchemaStore) -> Self {
        self.store = store;
        self
    }

    /// Returns the schema store.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Returns the default draft.
    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(self.draft.to_jsonschema());
        opts.should_validate_formats(self.validate_formats);
        opts.with_retriever(self.store.retriever());
        opts
    }
}

#[async_trait]
impl SchemaEngine for JsonSchemaEngine {
    async fn compile(&self, schema: &Value) -> Result<Arc<dyn CompiledSchema>, SchemaError> {
        let validator = self
            .build_options()
            .build(schema)
            .map_err(|e| SchemaError::compile(schema, e.to_string()))?;
        tracing::trace!(schema = %crate::engine::schema_name(schema), "compiled schema");
        Ok(Arc::new(JsonSchemaValidator { validator }))
    }
}

/// A compiled `jsonschema::Validator`.
struct JsonSchemaValidator {
    validator: Validator,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

#[async_trait]
impl CompiledSchema for JsonSchemaValidator {
    async fn validate(&self, instance: &Value) -> Result<(), EngineError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| {
                Violation::new(
                    e.instance_path.to_string(),
                    e.schema_path.to_string(),
                    e.to_string(),
                )
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Invalid(ValidationViolations::new(violations)))
        }
    }
}
