//! # Engine Options
//!
//! Configuration for the default [`JsonSchemaEngine`](crate::JsonSchemaEngine).
//! Loadable from YAML so hosts can keep validator settings next to their
//! other service configuration:
//!
//! ```yaml
//! draft: "2020-12"
//! validate_formats: true
//! schema_dir: ./schemas
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::SchemaError;

/// JSON Schema draft used when a schema does not declare `$schema`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaDraft {
    #[serde(rename = "4")]
    Draft4,
    #[serde(rename = "6")]
    Draft6,
    #[serde(rename = "7")]
    Draft7,
    #[serde(rename = "2019-09")]
    Draft201909,
    #[default]
    #[serde(rename = "2020-12")]
    Draft202012,
}

impl SchemaDraft {
    pub(crate) fn to_jsonschema(self) -> jsonschema::Draft {
        match self {
            Self::Draft4 => jsonschema::Draft::Draft4,
            Self::Draft6 => jsonschema::Draft::Draft6,
            Self::Draft7 => jsonschema::Draft::Draft7,
            Self::Draft201909 => jsonschema::Draft::Draft201909,
            Self::Draft202012 => jsonschema::Draft::Draft202012,
        }
    }
}

impl std::str::FromStr for SchemaDraft {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4" | "draft4" => Ok(Self::Draft4),
            "6" | "draft6" => Ok(Self::Draft6),
            "7" | "draft7" => Ok(Self::Draft7),
            "2019-09" | "draft2019-09" => Ok(Self::Draft201909),
            "2020-12" | "draft2020-12" => Ok(Self::Draft202012),
            other => Err(format!(
                "unknown draft '{other}' (expected 4, 6, 7, 2019-09 or 2020-12)"
            )),
        }
    }
}

/// Options for building the default engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Draft applied to schemas without a `$schema` keyword.
    pub draft: SchemaDraft,
    /// Treat `format` as an assertion rather than an annotation.
    pub validate_formats: bool,
    /// Directory of `*.schema.json` files registered for `$ref` resolution.
    pub schema_dir: Option<PathBuf>,
}

impl EngineOptions {
    /// Parse options from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(content).map_err(|e| SchemaError::Load {
            schema_name: "engine options".to_string(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Read and parse options from a YAML file.
    ///
    /// A relative `schema_dir` is resolved against the file's directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Load {
            schema_name: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;
        let mut options = Self::from_yaml_str(&content)?;
        if let (Some(dir), Some(parent)) = (options.schema_dir.as_ref(), path.parent()) {
            if dir.is_relative() {
                options.schema_dir = Some(parent.join(dir));
            }
        }
        Ok(options)
    }
}
