//! # Check Subcommand
//!
//! Runs a static validation config against a request document, exactly as
//! the middleware would for a live request. The request document is an
//! object keyed by attribute name:
//!
//! ```json
//! { "body": { "id": 1 }, "query": { "page": "2" } }
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::Value;
use sgate_middleware::{Outcome, ValidationConfig, Validator};
use sgate_schema::{EngineOptions, SchemaDraft};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Validation config: YAML or JSON mapping of attribute to schema.
    #[arg(long)]
    pub config: PathBuf,

    /// Request document to validate (JSON, or YAML by extension).
    #[arg(long)]
    pub request: PathBuf,

    /// Engine options file (YAML). Flags below override its values.
    #[arg(long)]
    pub engine_config: Option<PathBuf>,

    /// Default JSON Schema draft (4, 6, 7, 2019-09, 2020-12).
    #[arg(long)]
    pub draft: Option<SchemaDraft>,

    /// Treat `format` as an assertion.
    #[arg(long)]
    pub validate_formats: bool,

    /// Directory of `*.schema.json` files available to `$ref`.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,
}

impl CheckArgs {
    /// Engine options from `--engine-config`, then flag overrides.
    pub fn engine_options(&self) -> anyhow::Result<EngineOptions> {
        let mut options = match &self.engine_config {
            Some(path) => EngineOptions::from_yaml_file(path)?,
            None => EngineOptions::default(),
        };
        if let Some(draft) = self.draft {
            options.draft = draft;
        }
        if self.validate_formats {
            options.validate_formats = true;
        }
        if let Some(dir) = &self.schema_dir {
            options.schema_dir = Some(dir.clone());
        }
        Ok(options)
    }
}

/// Validate the request; `Ok(None)` on pass, `Ok(Some(report))` on failure.
///
/// Config, schema, and request loading problems are errors.
pub async fn run(args: &CheckArgs) -> anyhow::Result<Option<Value>> {
    let validator = Validator::with_options(args.engine_options()?)?;
    let config = ValidationConfig::<Value>::from_yaml_file(&args.config)?;
    tracing::info!(
        config = %args.config.display(),
        attributes = config.len(),
        "loaded validation config"
    );

    let request = crate::read_document(&args.request)?;
    anyhow::ensure!(
        request.is_object(),
        "{}: request document must be an object keyed by attribute",
        args.request.display()
    );

    let middleware = validator
        .validate(config)
        .await
        .with_context(|| format!("compiling {}", args.config.display()))?;

    match middleware.check(&request).await? {
        Outcome::Pass => Ok(None),
        Outcome::Reject(failure) => Ok(Some(serde_json::to_value(&failure)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path, config: &str, request: &str) -> CheckArgs {
        let config_path = dir.join("validation.yaml");
        let request_path = dir.join("request.json");
        std::fs::write(&config_path, config).unwrap();
        std::fs::write(&request_path, request).unwrap();
        CheckArgs {
            config: config_path,
            request: request_path,
            engine_config: None,
            draft: None,
            validate_formats: false,
            schema_dir: None,
        }
    }

    const CONFIG: &str = "body:\n  type: object\n  required: [id]\n";

    #[tokio::test]
    async fn passing_request() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), CONFIG, r#"{"body": {"id": 1}}"#);
        assert!(run(&args).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_request_reports_collection() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), CONFIG, r#"{"body": {}}"#);
        let report = run(&args).await.unwrap().unwrap();
        assert_eq!(report["name"], "JsonSchemaValidationError");
        assert_eq!(report["validation_errors"]["body"][0]["keyword"], "required");
    }

    #[tokio::test]
    async fn malformed_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), "body:\n  type: 5\n", r#"{"body": {}}"#);
        assert!(run(&args).await.is_err());
    }

    #[tokio::test]
    async fn non_object_request_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path(), CONFIG, "[1, 2]");
        let err = run(&args).await.unwrap_err();
        assert!(err.to_string().contains("must be an object"), "got: {err}");
    }

    #[test]
    fn flags_override_engine_config() {
        let dir = tempfile::tempdir().unwrap();
        let engine_path = dir.path().join("engine.yaml");
        std::fs::write(&engine_path, "draft: \"7\"\n").unwrap();
        let mut args = args(dir.path(), CONFIG, "{}");
        args.engine_config = Some(engine_path);
        args.validate_formats = true;

        let options = args.engine_options().unwrap();
        assert_eq!(options.draft, SchemaDraft::Draft7);
        assert!(options.validate_formats);

        args.draft = Some(SchemaDraft::Draft4);
        assert_eq!(args.engine_options().unwrap().draft, SchemaDraft::Draft4);
    }
}
