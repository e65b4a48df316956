//! Errors raised while compiling or exporting a form.

use thiserror::Error;

/// A form that cannot be turned into a schema.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A field's `valid_pattern` is not a valid regular expression.
    #[error("field '{field}' on form '{form}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Id of the form declaring the field.
        form: String,
        /// Field id.
        field: String,
        /// The rejected pattern.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The exported JSON Schema was rejected by the `jsonschema` crate.
    #[error("JSON Schema for form '{form}' could not be built: {reason}")]
    JsonSchema {
        /// Id of the exported form.
        form: String,
        /// Reason reported by the validator builder.
        reason: String,
    },
}
