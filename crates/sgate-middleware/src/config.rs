//! # Validation Configuration
//!
//! Ordered mapping from request-attribute name to the schema that governs
//! it. A schema is either a literal value, compiled once when the middleware
//! is built, or a function of the request, compiled on every request.
//!
//! Iteration order is insertion order and decides the order attributes are
//! validated and reported in.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use sgate_schema::{yaml_to_json_value, SchemaError};

/// Error type schema functions may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request-derived schema: called with the current request, returns the
/// schema to compile and apply for that request only.
pub type SchemaFn<R> = Arc<dyn Fn(&R) -> Result<Value, BoxError> + Send + Sync>;

/// Where an attribute's schema comes from.
pub enum SchemaSource<R> {
    /// A literal schema, compiled when the middleware is built.
    Static(Value),
    /// A schema computed from each request and compiled per request.
    Dynamic(SchemaFn<R>),
}

impl<R> SchemaSource<R> {
    /// Returns true for request-derived schemas.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<R> Clone for SchemaSource<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(schema) => Self::Static(schema.clone()),
            Self::Dynamic(schema_fn) => Self::Dynamic(Arc::clone(schema_fn)),
        }
    }
}

impl<R> fmt::Debug for SchemaSource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(schema) => f.debug_tuple("Static").field(schema).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Attribute → schema mapping handed to [`Validator::validate`](crate::Validator::validate).
pub struct ValidationConfig<R> {
    entries: Vec<(String, SchemaSource<R>)>,
}

impl<R> ValidationConfig<R> {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set `attribute` to a literal schema.
    pub fn schema(self, attribute: impl Into<String>, schema: Value) -> Self {
        self.insert(attribute, SchemaSource::Static(schema))
    }

    /// Set `attribute` to a schema computed from each request.
    pub fn dynamic<F>(self, attribute: impl Into<String>, schema_fn: F) -> Self
    where
        F: Fn(&R) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.insert(attribute, SchemaSource::Dynamic(Arc::new(schema_fn)))
    }

    /// Set `attribute` to `source`.
    ///
    /// Keys are unique: setting an attribute that is already configured
    /// replaces its schema and keeps its original position.
    pub fn insert(mut self, attribute: impl Into<String>, source: SchemaSource<R>) -> Self {
        let attribute = attribute.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, existing)) => *existing = source,
            None => self.entries.push((attribute, source)),
        }
        self
    }

    /// Returns the number of configured attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no attributes are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured attribute names in validation order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Look up the schema source for `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&SchemaSource<R>> {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, source)| source)
    }

    pub(crate) fn into_entries(self) -> Vec<(String, SchemaSource<R>)> {
        self.entries
    }

    /// Build a static configuration from a JSON object of `attribute: schema`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Load` if `value` is not an object.
    pub fn from_json_value(value: Value) -> Result<Self, SchemaError> {
        let Value::Object(object) = value else {
            return Err(SchemaError::Load {
                schema_name: "validation config".to_string(),
                reason: "expected a mapping of request attribute to schema".to_string(),
            });
        };
        Ok(object
            .into_iter()
            .fold(Self::new(), |config, (attribute, schema)| {
                config.schema(attribute, schema)
            }))
    }

    /// Parse a static configuration from YAML, preserving document order:
    ///
    /// ```yaml
    /// body:
    ///   type: object
    ///   required: [id]
    /// query:
    ///   type: object
    ///   properties:
    ///     page: { type: string, pattern: "^[0-9]+$" }
    /// ```
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content)
            .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
        let value = yaml_to_json_value(&yaml)
            .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))?;
        Self::from_json_value(value)
    }

    /// Read a static configuration from a YAML (or JSON) file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
            schema_name: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            SchemaError::Load { reason, .. } => SchemaError::Load {
                schema_name: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

fn load_error(reason: String) -> SchemaError {
    SchemaError::Load {
        schema_name: "validation config".to_string(),
        reason,
    }
}

impl<R> Default for ValidationConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ValidationConfig<R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<R> fmt::Debug for ValidationConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, source)| (name, source)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    type Config = ValidationConfig<Map<String, Value>>;

    #[test]
    fn preserves_insertion_order() {
        let config = Config::new()
            .schema("query", json!({"type": "object"}))
            .schema("body", json!({"type": "object"}))
            .dynamic("params", |_| Ok(json!(true)));
        let attrs: Vec<&str> = config.attributes().collect();
        assert_eq!(attrs, ["query", "body", "params"]);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let config = Config::new()
            .schema("body", json!({"type": "object"}))
            .schema("query", json!({"type": "object"}))
            .dynamic("body", |_| Ok(json!({"type": "array"})));
        assert_eq!(config.len(), 2);
        let attrs: Vec<&str> = config.attributes().collect();
        assert_eq!(attrs, ["body", "query"]);
        assert!(config.get("body").unwrap().is_dynamic());
    }

    #[test]
    fn from_yaml_preserves_order() {
        let config = Config::from_yaml_str(
            r#"
query:
  type: object
body:
  type: object
  required: [id]
headers:
  type: object
"#,
        )
        .unwrap();
        let attrs: Vec<&str> = config.attributes().collect();
        assert_eq!(attrs, ["query", "body", "headers"]);
        match config.get("body").unwrap() {
            SchemaSource::Static(schema) => assert_eq!(schema["required"][0], "id"),
            other => panic!("expected Static, got: {other:?}"),
        }
    }

    #[test]
    fn from_yaml_rejects_non_mapping() {
        let err = Config::from_yaml_str("- body\n- query\n").unwrap_err();
        assert!(matches!(err, SchemaError::Load { .. }), "got: {err}");
    }

    #[test]
    fn from_yaml_file_names_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.yaml");
        std::fs::write(&path, "body: [unclosed\n").unwrap();
        match Config::from_yaml_file(&path).unwrap_err() {
            SchemaError::Load { schema_name, .. } => {
                assert!(schema_name.ends_with("validation.yaml"), "got: {schema_name}")
            }
            other => panic!("expected Load, got: {other}"),
        }
    }

    #[test]
    fn debug_hides_schema_functions() {
        let config = Config::new().dynamic("body", |_| Ok(json!({})));
        assert!(format!("{config:?}").contains("Dynamic(..)"));
    }
}
