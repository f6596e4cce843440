//! # Schemas Subcommand
//!
//! Lists the schemas a directory contributes to `$ref` resolution.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;
use sgate_schema::SchemaStore;

/// Arguments for the schemas subcommand.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    /// Directory of `*.schema.json` files.
    #[arg(long)]
    pub schema_dir: PathBuf,
}

/// One line per schema: filename, then its `$id` when declared.
pub fn run(args: &SchemasArgs) -> anyhow::Result<Vec<String>> {
    let store = SchemaStore::load(&args.schema_dir)?;
    Ok(store
        .schema_names()
        .into_iter()
        .map(|name| {
            match store
                .get_schema(name)
                .and_then(|s| s.get("$id"))
                .and_then(Value::as_str)
            {
                Some(id) => format!("{name}\t{id}"),
                None => name.to_string(),
            }
        })
        .collect())
}
