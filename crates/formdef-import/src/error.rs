//! Errors raised while reading or writing import inputs and outputs.
//!
//! Problems *inside* a catalog or document (cycles, unknown types,
//! dangling references) are advisories, not errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for the expected shape.
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize form '{form}': {source}")]
    Serialize {
        form: String,
        #[source]
        source: serde_json::Error,
    },

    /// A canonical form file without an `id`.
    #[error("form file '{0}' has no id")]
    MissingId(PathBuf),
}
