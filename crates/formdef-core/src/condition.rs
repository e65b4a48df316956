//! # Conditions
//!
//! A predicate over one field's live value, used for visibility rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormError;

/// Comparator applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    #[default]
    #[serde(alias = "=")]
    Equals,
    #[serde(alias = "!=")]
    NotEquals,
    #[serde(alias = "<")]
    LessThan,
    #[serde(alias = "<=")]
    LessThanOrEqualTo,
    #[serde(alias = ">")]
    GreaterThan,
    #[serde(alias = ">=")]
    GreaterThanOrEqualTo,
    IsDefined,
    IsNonEmpty,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::LessThan => "lessThan",
            Self::LessThanOrEqualTo => "lessThanOrEqualTo",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanOrEqualTo => "greaterThanOrEqualTo",
            Self::IsDefined => "isDefined",
            Self::IsNonEmpty => "isNonEmpty",
        };
        f.write_str(s)
    }
}

/// `field <comparison> value`, or membership in `any_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field: String,

    #[serde(default)]
    pub comparison: Comparison,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_values: Vec<Value>,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            field: field.into(),
            comparison,
            value: None,
            any_values: Vec::new(),
        }
    }

    /// `field == value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Comparison::Equals).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_any_values(mut self, values: Vec<Value>) -> Self {
        self.any_values = values;
        self
    }

    /// Test the condition against a field's current value.
    ///
    /// Absent data simply fails the predicate. A condition that cannot be
    /// evaluated at all (an ordering comparison with no numeric operand) is
    /// an authoring error.
    pub fn holds(&self, actual: Option<&Value>) -> Result<bool, FormError> {
        let actual = actual.filter(|v| !v.is_null());
        match self.comparison {
            Comparison::IsDefined => Ok(actual.is_some()),
            Comparison::IsNonEmpty => Ok(actual.is_some_and(is_non_empty)),
            Comparison::Equals => Ok(actual.is_some_and(|v| self.matches_expected(v))),
            Comparison::NotEquals => Ok(!actual.is_some_and(|v| self.matches_expected(v))),
            Comparison::LessThan
            | Comparison::LessThanOrEqualTo
            | Comparison::GreaterThan
            | Comparison::GreaterThanOrEqualTo => {
                let expected = self
                    .value
                    .as_ref()
                    .and_then(Value::as_f64)
                    .ok_or_else(|| FormError::InvalidComparison {
                        field: self.field.clone(),
                        comparison: self.comparison.to_string(),
                        reason: "expected a numeric comparison value".to_string(),
                    })?;
                let Some(actual) = actual.and_then(Value::as_f64) else {
                    return Ok(false);
                };
                Ok(match self.comparison {
                    Comparison::LessThan => actual < expected,
                    Comparison::LessThanOrEqualTo => actual <= expected,
                    Comparison::GreaterThan => actual > expected,
                    _ => actual >= expected,
                })
            }
        }
    }

    fn matches_expected(&self, actual: &Value) -> bool {
        if !self.any_values.is_empty() {
            return self.any_values.iter().any(|e| loose_eq(e, actual));
        }
        self.value.as_ref().is_some_and(|e| loose_eq(e, actual))
    }
}

/// Equality with numbers compared by value (`1` == `1.0`).
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn is_non_empty(v: &Value) -> bool {
    match v {
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equals_is_numeric_aware() {
        let c = Condition::equals("size", 1);
        assert!(c.holds(Some(&json!(1.0))).unwrap());
        assert!(!c.holds(Some(&json!(2))).unwrap());
        assert!(!c.holds(None).unwrap());
    }

    #[test]
    fn any_values_membership() {
        let c = Condition::new("mode", Comparison::Equals)
            .with_any_values(vec![json!("a"), json!("b")]);
        assert!(c.holds(Some(&json!("b"))).unwrap());
        assert!(!c.holds(Some(&json!("c"))).unwrap());
    }

    #[test]
    fn not_equals_holds_for_absent() {
        let c = Condition::new("mode", Comparison::NotEquals).with_value("a");
        assert!(c.holds(None).unwrap());
        assert!(!c.holds(Some(&json!("a"))).unwrap());
    }

    #[test]
    fn ordering_comparisons() {
        let lt = Condition::new("n", Comparison::LessThan).with_value(5);
        assert!(lt.holds(Some(&json!(4))).unwrap());
        assert!(!lt.holds(Some(&json!(5))).unwrap());
        let ge = Condition::new("n", Comparison::GreaterThanOrEqualTo).with_value(5);
        assert!(ge.holds(Some(&json!(5))).unwrap());
        assert!(!ge.holds(Some(&json!("x"))).unwrap());
    }

    #[test]
    fn ordering_without_numeric_value_fails_loud() {
        let c = Condition::new("n", Comparison::GreaterThan).with_value("big");
        assert!(matches!(
            c.holds(Some(&json!(1))),
            Err(FormError::InvalidComparison { .. })
        ));
    }

    #[test]
    fn defined_and_non_empty() {
        let defined = Condition::new("x", Comparison::IsDefined);
        assert!(defined.holds(Some(&json!(""))).unwrap());
        assert!(!defined.holds(Some(&Value::Null)).unwrap());
        let non_empty = Condition::new("x", Comparison::IsNonEmpty);
        assert!(!non_empty.holds(Some(&json!(""))).unwrap());
        assert!(!non_empty.holds(Some(&json!({}))).unwrap());
        assert!(non_empty.holds(Some(&json!([1]))).unwrap());
    }

    #[test]
    fn comparison_aliases_deserialize() {
        let c: Condition = serde_json::from_value(json!({"field": "a", "comparison": ">=", "value": 2})).unwrap();
        assert_eq!(c.comparison, Comparison::GreaterThanOrEqualTo);
        let d: Condition = serde_json::from_value(json!({"field": "a", "value": 2})).unwrap();
        assert_eq!(d.comparison, Comparison::Equals);
    }
}
