//! # Schema Store
//!
//! Named schemas that request schemas may `$ref`. The store is loaded once
//! (typically from a directory of `*.schema.json` files) and handed to the
//! engine, which installs a [`LocalSchemaRetriever`] so every cross-schema
//! reference resolves in memory.
//!
//! Each schema is reachable under its filename and under its own `$id`.
//! References are also matched by their final path segment, so
//! `https://schemas.example.org/address.schema.json` finds a file stored as
//! `address.schema.json` even when the file declares no `$id`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::{Retrieve, Uri};
use serde_json::Value;

use crate::engine::SchemaError;

/// File suffix for schemas picked up by [`SchemaStore::load`].
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// In-memory registry of named schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    /// Directory the store was loaded from, if any.
    schema_dir: Option<PathBuf>,
    /// Map from schema filename to parsed JSON value.
    schemas: BTreeMap<String, Value>,
}

impl SchemaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.schema.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Load` if the directory cannot be read or any
    /// schema file is not valid JSON.
    pub fn load(schema_dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = BTreeMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| SchemaError::Load {
            schema_name: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(SCHEMA_FILE_SUFFIX) {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Load {
                schema_name: name.to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;
            schemas.insert(name.to_string(), value);
        }

        tracing::debug!(
            dir = %schema_dir.display(),
            count = schemas.len(),
            "loaded schema store"
        );

        Ok(Self {
            schema_dir: Some(schema_dir),
            schemas,
        })
    }

    /// Register a schema under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, schema: Value) {
        self.schemas.insert(name.into(), schema);
    }

    /// Returns the directory the store was loaded from.
    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the names of all loaded schemas, sorted alphabetically.
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Look up a schema by filename.
    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Build the retriever the engine installs for `$ref` resolution.
    pub(crate) fn retriever(&self) -> LocalSchemaRetriever {
        let mut schemas_by_uri = HashMap::new();
        for (filename, value) in &self.schemas {
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                schemas_by_uri.insert(id.to_string(), value.clone());
            }
            schemas_by_uri.insert(filename.clone(), value.clone());
        }
        LocalSchemaRetriever {
            schemas_by_uri: Arc::new(schemas_by_uri),
        }
    }
}

/// Resolves `$ref` URIs against the store without network access.
#[derive(Debug, Clone)]
pub(crate) struct LocalSchemaRetriever {
    schemas_by_uri: Arc<HashMap<String, Value>>,
}

impl LocalSchemaRetriever {
    fn lookup(&self, uri: &str) -> Option<&Value> {
        if let Some(value) = self.schemas_by_uri.get(uri) {
            return Some(value);
        }
        let filename = uri.rsplit('/').next().unwrap_or(uri);
        self.schemas_by_uri.get(filename)
    }
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        self.lookup(uri)
            .cloned()
            .ok_or_else(|| format!("schema '{uri}' is not in the local schema store").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_schema(dir: &Path, name: &str, value: &Value) {
        std::fs::write(dir.join(name), serde_json::to_vec_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn test_load_picks_only_schema_files() {
        let dir = tempfile::tempdir().unwrap();
        write_schema(dir.path(), "address.schema.json", &json!({"type": "object"}));
        write_schema(dir.path(), "tenant.schema.json", &json!({"type": "string"}));
        std::fs::write(dir.path().join("README.md"), "not a schema").unwrap();

        let store = SchemaStore::load(dir.path()).unwrap();
        assert_eq!(store.schema_count(), 2);
        assert_eq!(
            store.schema_names(),
            vec!["address.schema.json", "tenant.schema.json"]
        );
        assert_eq!(store.schema_dir(), Some(dir.path()));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), "{ not json").unwrap();
        let err = SchemaStore::load(dir.path()).unwrap_err();
        match err {
            SchemaError::Load { schema_name, reason } => {
                assert_eq!(schema_name, "broken.schema.json");
                assert!(reason.contains("invalid JSON"));
            }
            other => panic!("expected Load, got: {other}"),
        }
    }

    #[test]
    fn test_load_missing_directory() {
        let err = SchemaStore::load("/nonexistent/schemagate/schemas").unwrap_err();
        assert!(matches!(err, SchemaError::Load { .. }), "got: {err}");
    }

    #[test]
    fn test_retriever_lookup_by_id_and_filename() {
        let mut store = SchemaStore::new();
        store.insert(
            "address.schema.json",
            json!({"$id": "https://schemas.example.org/common/address", "type": "object"}),
        );
        let retriever = store.retriever();

        assert!(retriever
            .lookup("https://schemas.example.org/common/address")
            .is_some());
        assert!(retriever.lookup("address.schema.json").is_some());
        assert!(retriever
            .lookup("https://elsewhere.example.org/address.schema.json")
            .is_some());
        assert!(retriever.lookup("https://example.org/missing.json").is_none());
    }
}
