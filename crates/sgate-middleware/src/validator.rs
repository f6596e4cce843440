//! # Validator Factory & Request Middleware
//!
//! [`Validator`] owns one schema engine and turns a [`ValidationConfig`]
//! into a [`RequestValidator`]. Literal schemas are compiled right there, so
//! a malformed schema fails registration instead of the first request.
//! Request-derived schemas are kept as functions and compiled on every
//! request they apply to.
//!
//! [`RequestValidator`] checks every configured attribute in order and does
//! not stop at the first failure: the resulting [`ValidationError`] lists
//! every failing attribute from a single pass.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use sgate_schema::{
    CompiledSchema, EngineError, EngineOptions, JsonSchemaEngine, SchemaEngine, SchemaError,
};

use crate::config::{SchemaFn, SchemaSource, ValidationConfig};
use crate::error::{ErrorCollection, MiddlewareError, ValidationError};
use crate::request::RequestAttributes;

/// Builds request validators that share one schema engine.
#[derive(Debug, Clone)]
pub struct Validator {
    engine: Arc<dyn SchemaEngine>,
}

impl Validator {
    /// Use an existing engine instance.
    pub fn new(engine: Arc<dyn SchemaEngine>) -> Self {
        Self { engine }
    }

    /// Build the default `jsonschema` engine from options.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Load` if the configured schema directory cannot be loaded.
    pub fn with_options(options: EngineOptions) -> Result<Self, SchemaError> {
        Ok(Self::new(Arc::new(JsonSchemaEngine::new(options)?)))
    }

    /// Returns the engine shared by every validator this factory builds.
    pub fn engine(&self) -> &Arc<dyn SchemaEngine> {
        &self.engine
    }

    /// Compile `config` into a request validator.
    ///
    /// Literal schemas are compiled eagerly, in configuration order.
    /// Request-derived schemas are stored uncompiled.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError::Compile` raised by a literal schema.
    pub async fn validate<R>(
        &self,
        config: ValidationConfig<R>,
    ) -> Result<RequestValidator<R>, SchemaError> {
        let mut entries = Vec::with_capacity(config.len());
        for (attribute, source) in config.into_entries() {
            entries.push(match source {
                SchemaSource::Static(schema) => CompiledEntry::Static {
                    attribute,
                    schema: self.engine.compile(&schema).await?,
                },
                SchemaSource::Dynamic(schema_fn) => CompiledEntry::Dynamic {
                    attribute,
                    schema_fn,
                },
            });
        }

        tracing::debug!(
            attributes = entries.len(),
            dynamic = entries.iter().filter(|e| e.is_dynamic()).count(),
            "built request validator"
        );

        Ok(RequestValidator {
            inner: Arc::new(Inner {
                entries,
                engine: Arc::clone(&self.engine),
            }),
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaEngine::default()))
    }
}

/// One configured attribute after registration.
pub enum CompiledEntry<R> {
    /// Literal schema, compiled once.
    Static {
        attribute: String,
        schema: Arc<dyn CompiledSchema>,
    },
    /// Request-derived schema, compiled per request.
    Dynamic {
        attribute: String,
        schema_fn: SchemaFn<R>,
    },
}

impl<R> CompiledEntry<R> {
    /// Attribute this entry validates.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Static { attribute, .. } | Self::Dynamic { attribute, .. } => attribute,
        }
    }

    /// Returns true for request-derived schemas.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }
}

impl<R> fmt::Debug for CompiledEntry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dynamic() { "Dynamic" } else { "Static" };
        f.debug_struct(kind)
            .field("attribute", &self.attribute())
            .finish_non_exhaustive()
    }
}

/// Result of checking one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every configured attribute satisfied its schema.
    Pass,
    /// At least one attribute failed.
    Reject(ValidationError),
}

impl Outcome {
    /// Returns true for [`Outcome::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// `Ok(())` on pass, `Err` with the failure otherwise.
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Pass => Ok(()),
            Self::Reject(err) => Err(err),
        }
    }
}

struct Inner<R> {
    entries: Vec<CompiledEntry<R>>,
    engine: Arc<dyn SchemaEngine>,
}

/// Compiled middleware for one validation configuration.
///
/// Cloning is cheap: clones share the compiled entries and the engine.
/// Nothing inside is mutated after construction, so one instance can serve
/// concurrent requests without locking.
pub struct RequestValidator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for RequestValidator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for RequestValidator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator")
            .field("entries", &self.inner.entries)
            .field("engine", &self.inner.engine)
            .finish()
    }
}

impl<R> RequestValidator<R> {
    /// Configured attributes in validation order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.inner.entries.iter().map(CompiledEntry::attribute)
    }

    /// Compiled entries in validation order.
    pub fn entries(&self) -> &[CompiledEntry<R>] {
        &self.inner.entries
    }

    /// Whether a check may look at attribute `name`: some entry targets it,
    /// or some entry derives its schema from the whole request.
    pub fn reads_attribute(&self, name: &str) -> bool {
        self.inner
            .entries
            .iter()
            .any(|entry| entry.is_dynamic() || entry.attribute() == name)
    }
}

impl<R: RequestAttributes> RequestValidator<R> {
    /// Validate every configured attribute of `request`.
    ///
    /// Invalid attributes are collected into [`Outcome::Reject`]. Schema
    /// function failures, compile errors of request-derived schemas, and
    /// engine failures abort the check and are returned as `Err`.
    pub async fn check(&self, request: &R) -> Result<Outcome, MiddlewareError> {
        let mut validation_errors = ErrorCollection::new();

        for entry in &self.inner.entries {
            let (attribute, schema) = match entry {
                CompiledEntry::Static { attribute, schema } => (attribute, Arc::clone(schema)),
                CompiledEntry::Dynamic {
                    attribute,
                    schema_fn,
                } => {
                    let schema_value = schema_fn(request).map_err(|source| {
                        MiddlewareError::SchemaFunction {
                            attribute: attribute.clone(),
                            source,
                        }
                    })?;
                    let schema = self
                        .inner
                        .engine
                        .compile(&schema_value)
                        .await
                        .map_err(|source| MiddlewareError::Compile {
                            attribute: attribute.clone(),
                            source,
                        })?;
                    (attribute, schema)
                }
            };

            let value = request.attribute(attribute).unwrap_or(&Value::Null);
            match schema.validate(value).await {
                Ok(()) => {}
                Err(EngineError::Invalid(violations)) => {
                    validation_errors.insert(attribute.clone(), violations);
                }
                Err(EngineError::Internal { reason }) => {
                    return Err(MiddlewareError::Engine {
                        attribute: attribute.clone(),
                        reason,
                    });
                }
            }
        }

        if validation_errors.is_empty() {
            Ok(Outcome::Pass)
        } else {
            tracing::debug!(
                failed = validation_errors.len(),
                attributes = ?validation_errors.attributes().collect::<Vec<_>>(),
                "request failed schema validation"
            );
            Ok(Outcome::Reject(ValidationError::new(validation_errors)))
        }
    }

    /// Continuation form: check `request`, then call `next` with `None` on
    /// pass or with the failure on rejection, and return what `next` returns.
    ///
    /// # Errors
    ///
    /// Propagates [`MiddlewareError`] from [`check`](Self::check) without
    /// calling `next`.
    pub async fn run<F, Fut, T>(&self, request: &R, next: F) -> Result<T, MiddlewareError>
    where
        F: FnOnce(Option<ValidationError>) -> Fut,
        Fut: Future<Output = T>,
    {
        let failure = match self.check(request).await? {
            Outcome::Pass => None,
            Outcome::Reject(err) => Some(err),
        };
        Ok(next(failure).await)
    }
}
