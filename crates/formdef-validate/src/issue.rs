//! Validation issues: the structured result of checking data against a form.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// How serious an [`Issue`] is. Callers decide what is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// The JSON kind of a non-object value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
    Array,
}

impl ScalarKind {
    /// The kind of `value`, or `None` for objects.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(Self::String),
            Value::Number(_) => Some(Self::Number),
            Value::Bool(_) => Some(Self::Boolean),
            Value::Null => Some(Self::Null),
            Value::Array(_) => Some(Self::Array),
            Value::Object(_) => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
        };
        f.write_str(s)
    }
}

/// Classification of an [`Issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum IssueKind {
    /// A bare scalar where the form declares no scalar representation.
    UnexpectedScalar { kind: ScalarKind },
    MissingRequired,
    /// The value does not have the field's (single) data type.
    TypeMismatch,
    /// The value matches none of the field's variants.
    NoMatchingAlternate { expected: usize },
    OutOfRange,
    InvalidLength,
    PatternMismatch,
    NotInChoices,
    /// A key the form does not declare and no catch-all describes.
    UnknownProperty,
    /// The form itself is broken at this point (e.g. an invalid pattern).
    InvalidSchema,
}

/// One problem found in the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// `/`-separated path to the offending value; empty for the root.
    pub path: String,
    pub message: String,
    pub kind: IssueKind,
    pub severity: Severity,
}

impl Issue {
    pub fn error(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
            severity: Severity::Error,
        }
    }

    pub fn warning(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(path, kind, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "(root)" } else { &self.path };
        match self.severity {
            Severity::Error => write!(f, "{path}: {}", self.message),
            Severity::Warning => write!(f, "{path}: warning: {}", self.message),
        }
    }
}
