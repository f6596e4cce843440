//! # sgate-schema — Schema-Validation Engine Boundary
//!
//! Everything schemagate knows about JSON Schema lives behind the
//! [`SchemaEngine`] trait defined here. The middleware crate never touches
//! the `jsonschema` crate directly; it compiles schemas and validates values
//! through this boundary only.
//!
//! ## Engine Contract (`engine`)
//!
//! - [`SchemaEngine::compile`] turns a schema value into a
//!   [`CompiledSchema`], failing with [`SchemaError::Compile`] on a
//!   malformed schema.
//! - [`CompiledSchema::validate`] checks one value and reports failure as
//!   [`EngineError::Invalid`] carrying every violation found. Any other
//!   engine failure is [`EngineError::Internal`] and is never treated as a
//!   validation result by callers.
//!
//! ## Default Engine (`json`)
//!
//! [`JsonSchemaEngine`] is built on the `jsonschema` crate. Draft selection
//! and format assertion come from [`EngineOptions`]; cross-schema `$ref`s
//! resolve against a [`SchemaStore`] loaded from disk and never hit the
//! network.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sgate-*` crates (leaf of the DAG).
//! - No `.unwrap()` outside tests.

pub mod engine;
pub mod json;
pub mod options;
pub mod store;
pub mod violation;
pub mod yaml;

pub use engine::{CompiledSchema, EngineError, SchemaEngine, SchemaError};
pub use json::JsonSchemaEngine;
pub use options::{EngineOptions, SchemaDraft};
pub use store::SchemaStore;
pub use violation::{ValidationViolations, Violation};
pub use yaml::yaml_to_json_value;
