//! # formdef-schema — Schema Compiler
//!
//! Compiles canonical forms into reusable artifacts:
//!
//! - [`CompiledSchema`]: an arena of [`Node`]s checked against JSON data at
//!   runtime. Built by [`compile_form`], or through a [`SchemaCompiler`]
//!   that caches one schema per form identity.
//! - [`to_json_schema`]: a draft 2020-12 JSON Schema export, and
//!   [`build_validator`] to run it through the `jsonschema` crate.
//! - [`generate_rust_types`]: static `serde` type declarations.
//!
//! All three handle cyclic form graphs (`sub_form_id` loops) by assigning
//! each form a node, definition or type name before visiting its fields.
//! The compiler accepts exactly the values the `formdef-validate` walk
//! accepts without error-severity issues.

pub mod codegen;
pub mod compiled;
pub mod compiler;
pub mod error;
pub mod json_schema;

pub use codegen::generate_rust_types;
pub use compiled::{CompiledSchema, Node, NodeId, Property, SchemaIssue, StrFormat};
pub use compiler::{compile_form, CompileOptions, SchemaCompiler};
pub use error::CompileError;
pub use json_schema::{build_validator, to_json_schema};
