//! # Advisories
//!
//! Non-fatal anomalies found while importing or merging forms. Each is
//! logged when recorded and kept in a report; the pipeline continues with
//! a best-effort fallback.

use std::fmt;

use serde::Serialize;

/// Classification of an [`Advisory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvisoryKind {
    /// A structurally identical duplicate field was dropped.
    DuplicateField,
    /// A zero-key object value was removed from data.
    EmptyObjectOmitted,
    /// A named schema node's expansion chain returned to itself.
    DependencyCycle,
    /// Nesting exceeded the configured maximum depth.
    DepthLimit,
    /// A reference to a named schema node did not resolve.
    UnresolvedReference,
    /// A type description could not be mapped to a data type.
    UnrecognizedType,
    /// Both `scalarField` and `scalarFieldUpgradeName` were present.
    ScalarAuthorityConflict,
    /// A field carried both an owned sub-form and a sub-form id.
    SubFormConflict,
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DuplicateField => "duplicate field",
            Self::EmptyObjectOmitted => "empty object omitted",
            Self::DependencyCycle => "dependency cycle",
            Self::DepthLimit => "depth limit",
            Self::UnresolvedReference => "unresolved reference",
            Self::UnrecognizedType => "unrecognized type",
            Self::ScalarAuthorityConflict => "scalar authority conflict",
            Self::SubFormConflict => "sub-form conflict",
        };
        f.write_str(s)
    }
}

/// A recorded import/merge anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    /// Form id, field path or schema node id the advisory is about.
    pub subject: String,
    pub message: String,
}

impl Advisory {
    /// Create an advisory and emit it as a log event.
    pub fn record(kind: AdvisoryKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let advisory = Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        match kind {
            AdvisoryKind::DependencyCycle
            | AdvisoryKind::DepthLimit
            | AdvisoryKind::UnresolvedReference => {
                tracing::warn!(kind = %advisory.kind, subject = %advisory.subject, "{}", advisory.message);
            }
            _ => {
                tracing::debug!(kind = %advisory.kind, subject = %advisory.subject, "{}", advisory.message);
            }
        }
        advisory
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}
