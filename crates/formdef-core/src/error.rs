//! # Error Types
//!
//! Errors raised for schema-authoring mistakes. These fail loudly: a
//! condition naming a field that does not exist, or a sub-form selector
//! that resolves to nothing, means the schema itself is broken.
//!
//! Problems with the *data* under test are never errors. The validator
//! reports them as issues and the merge engine as advisories.

use thiserror::Error;

/// Top-level error type for form definitions.
#[derive(Error, Debug)]
pub enum FormError {
    /// A condition names a field the form does not declare.
    #[error("condition on form '{form}' references unknown field '{field}'")]
    UnknownConditionField {
        /// Id of the form the condition was evaluated against.
        form: String,
        /// Field id named by the condition.
        field: String,
    },

    /// A sub-form selector did not resolve.
    #[error("sub-form selector '{selector}' on form '{form}' failed at segment '{segment}': {reason}")]
    SubFormNotFound {
        /// Id of the form the selector started from.
        form: String,
        /// The full selector path.
        selector: String,
        /// The path segment that failed.
        segment: String,
        /// Why the segment did not resolve.
        reason: String,
    },

    /// A numeric tag or name is not a known data type.
    #[error("unknown data type '{0}'")]
    UnknownDataType(String),

    /// A comparison could not be performed on the given values.
    #[error("cannot compare field '{field}' with {comparison}: {reason}")]
    InvalidComparison {
        /// Field id.
        field: String,
        /// Comparison name.
        comparison: String,
        /// Why the comparison is invalid.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
