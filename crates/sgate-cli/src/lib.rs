//! # sgate-cli — schemagate Command-Line Interface
//!
//! ## Subcommands
//!
//! - `check` — run a validation config against a request document offline
//! - `schemas` — list the schemas a schema directory provides
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in each subcommand's `Args` struct.
//! - Handlers delegate to `sgate-middleware` / `sgate-schema`; no validation
//!   logic here.

pub mod check;
pub mod schemas;

use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Read a JSON or YAML document, choosing the format by file extension.
pub fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML in {}", path.display()))?;
            sgate_schema::yaml_to_json_value(&yaml)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
        }
        _ => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display())),
    }
}
