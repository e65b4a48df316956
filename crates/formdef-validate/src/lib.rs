//! # formdef-validate — Data Validation
//!
//! Checks JSON data against a canonical [`Form`](formdef_core::Form).
//! Problems with the data are never errors: they come back as a flat list
//! of [`Issue`]s, each with a path, a message, a classification and a
//! severity, and the caller decides what is fatal.
//!
//! - `validator.rs`: the form walk ([`validate`], [`validate_with`]).
//! - `mismatch.rs`: per-tag shape compatibility ([`get_data_mismatch_error`]).
//! - `issue.rs`: the issue model.

pub mod issue;
pub mod mismatch;
pub mod validator;

pub use issue::{Issue, IssueKind, ScalarKind, Severity};
pub use mismatch::{expected_shape, get_data_mismatch_error};
pub use validator::{validate, validate_with, ValidationOptions};
