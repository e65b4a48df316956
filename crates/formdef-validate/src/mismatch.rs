//! # Data-Type Compatibility
//!
//! [`get_data_mismatch_error`] decides whether a JSON value has the shape
//! a data-type tag describes. The relation is one-to-many: a JSON object
//! is compatible with `object`, every keyed collection, event triggers and
//! filters, because those tags are alternate representations of the same
//! host shape.
//!
//! Collections and arrays are checked element by element; nested objects
//! are only checked for being objects (their fields belong to a sub-form).

use formdef_core::{is_version_string, DataType};
use serde_json::{Map, Value};

/// JSON kind name used in messages.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

fn numbers(items: &[Value], integers: bool) -> bool {
    items
        .iter()
        .all(|v| if integers { is_integer(v) } else { v.is_number() })
}

fn point_object(map: &Map<String, Value>, axes: &[&str], integers: bool) -> bool {
    axes.iter().all(|axis| match map.get(*axis) {
        Some(v) if integers => is_integer(v),
        Some(v) => v.is_number(),
        None => false,
    })
}

/// A short description of what `data_type` accepts.
pub fn expected_shape(data_type: DataType) -> &'static str {
    use DataType as T;
    match data_type {
        T::Int | T::IntEnum | T::IntValueLookup | T::Long => "an integer",
        T::Float | T::Number => "a number",
        T::Boolean => "a boolean",
        T::IntBoolean => "a boolean or 0/1",
        T::Uuid => "a UUID string",
        T::Version => "a version string or [major, minor, patch]",
        T::Point2 => "an [x, y] pair or {x, y} object",
        T::Point3 => "an [x, y, z] triple or {x, y, z} object",
        T::IntPoint3 => "an integer [x, y, z] triple or {x, y, z} object",
        T::IntRange => "an integer, [min, max] pair or {min, max} object",
        T::FloatRange | T::PercentRange => "a number, [min, max] pair or {min, max} object",
        T::Object => "an object",
        T::FilterExpression => "a filter object or array of filters",
        T::EventTrigger => "an event trigger object or event name",
        T::MolangExpression => "a Molang expression string or number",
        t if t.is_string() => "a string",
        t if t.is_keyed_collection() => "an object",
        t if t.is_array() => "an array",
        _ => "a value",
    }
}

/// Why `value` is incompatible with `data_type`, or `None` when it fits.
pub fn get_data_mismatch_error(value: &Value, data_type: DataType) -> Option<String> {
    use DataType as T;

    let fits = match data_type {
        T::Int | T::IntEnum | T::IntValueLookup | T::Long => is_integer(value),
        T::Float | T::Number => value.is_number(),
        T::Boolean => value.is_boolean(),
        T::IntBoolean => {
            value.is_boolean() || matches!(value.as_u64(), Some(0 | 1))
        }
        T::Uuid => value
            .as_str()
            .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
        T::Version => match value {
            Value::String(s) => is_version_string(s),
            Value::Array(items) => items.len() == 3 && items.iter().all(|v| v.as_u64().is_some()),
            _ => false,
        },
        T::Point2 | T::Point3 | T::IntPoint3 => {
            let axes: &[&str] = if data_type == T::Point2 { &["x", "y"] } else { &["x", "y", "z"] };
            let integers = data_type == T::IntPoint3;
            match value {
                Value::Array(items) => items.len() == axes.len() && numbers(items, integers),
                Value::Object(map) => point_object(map, axes, integers),
                _ => false,
            }
        }
        T::IntRange | T::FloatRange | T::PercentRange => {
            let integers = data_type == T::IntRange;
            let bound = |v: &Value| if integers { is_integer(v) } else { v.is_number() };
            match value {
                Value::Number(_) => bound(value),
                Value::Array(items) => items.len() == 2 && items.iter().all(bound),
                Value::Object(map) => ["min", "max"]
                    .iter()
                    .all(|k| map.get(*k).map_or(true, bound)),
                _ => false,
            }
        }
        T::Object => value.is_object(),
        T::FilterExpression => match value {
            Value::Object(_) => true,
            Value::Array(items) => items.iter().all(Value::is_object),
            _ => false,
        },
        T::EventTrigger => value.is_object() || value.is_string(),
        T::MolangExpression => value.is_string() || value.is_number(),
        t if t.is_string() => value.is_string(),
        t if t.is_keyed_collection() || t.is_array() => {
            return collection_mismatch(value, t);
        }
        _ => true,
    };

    if fits {
        None
    } else {
        Some(format!(
            "expected {} but found {}",
            expected_shape(data_type),
            describe(value)
        ))
    }
}

fn collection_mismatch(value: &Value, data_type: DataType) -> Option<String> {
    let element = data_type.element_type()?;
    match value {
        Value::Object(map) if data_type.is_keyed_collection() => map.iter().find_map(|(k, v)| {
            get_data_mismatch_error(v, element).map(|e| format!("entry '{k}': {e}"))
        }),
        Value::Array(items) if data_type.is_array() => {
            items.iter().enumerate().find_map(|(i, v)| {
                get_data_mismatch_error(v, element).map(|e| format!("element {i}: {e}"))
            })
        }
        _ => Some(format!(
            "expected {} but found {}",
            expected_shape(data_type),
            describe(value)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fits(value: Value, t: DataType) -> bool {
        get_data_mismatch_error(&value, t).is_none()
    }

    #[test]
    fn object_is_compatible_with_many_tags() {
        let obj = json!({"a": "b"});
        for t in [
            DataType::Object,
            DataType::KeyedStringCollection,
            DataType::EventTrigger,
            DataType::FilterExpression,
        ] {
            assert!(fits(obj.clone(), t), "{t}");
        }
        assert!(!fits(obj, DataType::KeyedNumberCollection));
    }

    #[test]
    fn keyed_object_collection_requires_object_entries() {
        assert!(fits(json!({"a": {}}), DataType::KeyedObjectCollection));
        assert!(fits(json!({}), DataType::KeyedObjectCollection));
        assert!(!fits(json!({"a": "b"}), DataType::KeyedObjectCollection));
    }

    #[test]
    fn integers_are_strict() {
        assert!(fits(json!(3), DataType::Int));
        assert!(!fits(json!(3.5), DataType::Int));
        assert!(fits(json!(3.5), DataType::Float));
        assert!(!fits(json!("3"), DataType::Number));
    }

    #[test]
    fn int_boolean_accepts_zero_one_and_bools() {
        assert!(fits(json!(true), DataType::IntBoolean));
        assert!(fits(json!(0), DataType::IntBoolean));
        assert!(fits(json!(1), DataType::IntBoolean));
        assert!(!fits(json!(2), DataType::IntBoolean));
        assert!(!fits(json!("true"), DataType::IntBoolean));
    }

    #[test]
    fn points_accept_tuple_or_object() {
        assert!(fits(json!([1, 2.5, 3]), DataType::Point3));
        assert!(fits(json!({"x": 1, "y": 2, "z": 3}), DataType::IntPoint3));
        assert!(!fits(json!([1, 2.5, 3]), DataType::IntPoint3));
        assert!(!fits(json!([1, 2]), DataType::Point3));
        assert!(fits(json!([1, 2]), DataType::Point2));
        assert!(!fits(json!({"x": 1}), DataType::Point2));
    }

    #[test]
    fn ranges_accept_tuple_object_or_scalar() {
        assert!(fits(json!([1, 4]), DataType::IntRange));
        assert!(fits(json!({"min": 1}), DataType::IntRange));
        assert!(fits(json!(3), DataType::IntRange));
        assert!(!fits(json!(0.5), DataType::IntRange));
        assert!(fits(json!(0.5), DataType::PercentRange));
        assert!(!fits(json!({"min": "low"}), DataType::FloatRange));
    }

    #[test]
    fn uuid_and_version() {
        assert!(fits(json!("c1a6e9b2-8f1e-4e55-9a43-0d6a0f2a4b1c"), DataType::Uuid));
        assert!(!fits(json!("not-a-uuid"), DataType::Uuid));
        assert!(fits(json!("1.20.0"), DataType::Version));
        assert!(fits(json!([1, 20, 0]), DataType::Version));
        assert!(!fits(json!("1..2"), DataType::Version));
        assert!(!fits(json!([1, 20]), DataType::Version));
    }

    #[test]
    fn collections_check_elements() {
        let err = get_data_mismatch_error(&json!({"a": "x", "b": 2}), DataType::KeyedStringCollection);
        assert_eq!(err.as_deref(), Some("entry 'b': expected a string but found integer"));
        assert!(fits(json!([["a"], ["b", "c"]]), DataType::TwoDStringArray));
        assert!(!fits(json!(["a"]), DataType::TwoDStringArray));
        assert!(fits(json!(["a", 1]), DataType::MolangExpressionArray));
        assert!(fits(json!(["evt", {"event": "e"}]), DataType::EventTriggerArray));
        assert!(!fits(json!({"a": 1}), DataType::IntArray));
    }

    #[test]
    fn null_fits_nothing() {
        for t in DataType::ALL {
            assert!(!fits(Value::Null, t), "{t}");
        }
    }
}
