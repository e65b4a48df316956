//! # Field Model
//!
//! One declared datum of a [`Form`]: its id, display metadata, data-type
//! tag, constraints, default value and, for structured kinds, the shape of
//! its nested value.
//!
//! ## Invariants
//!
//! - At most one of `sub_form` (owned nested form) and `sub_form_id`
//!   (named back-reference resolved through a registry, never ownership).
//! - `alternates` are sibling shapes sharing this field's `id`. They never
//!   carry alternates of their own; the merge engine flattens them.
//! - `id` is unique among the primary fields of a form once merged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Condition;
use crate::data_type::DataType;
use crate::form::Form;

fn is_false(b: &bool) -> bool {
    !*b
}

/// One entry of a field's closed choice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// The literal value stored in data (string or integer).
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Choice {
    /// A choice with no display metadata.
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
        }
    }

    /// Attach a display title.
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether `value` is this choice. Integer ids written as strings
    /// (`"3"`) match numeric data.
    pub fn matches(&self, value: &Value) -> bool {
        match (&self.id, value) {
            (Value::String(id), Value::Number(n)) => id.parse::<f64>().ok() == n.as_f64(),
            (Value::Number(id), Value::Number(n)) => id.as_f64() == n.as_f64(),
            (id, v) => id == v,
        }
    }
}

/// One declared property within a [`Form`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Property name in the data.
    pub id: String,

    /// Legacy property name read when `id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub data_type: DataType,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Inclusive lower bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    /// Inclusive upper bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    /// Minimum string length or array element count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum string length or array element count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression a string value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,

    /// Owned nested form describing an object/array element shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_form: Option<Arc<Form>>,

    /// Named form resolved through a registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_form_id: Option<String>,

    /// Mutually exclusive alternate shapes for the same id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<Field>,

    /// Catch-all describing values of undeclared property names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field: Option<Box<Field>>,

    /// Collapse a zero-key object value to "absent".
    #[serde(default, skip_serializing_if = "is_false")]
    pub undefined_if_empty: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deprecated: bool,

    /// Tombstone: a hand-authored fragment deleting a generated field.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_removed: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visibility_conditions: Vec<Condition>,
}

impl Field {
    pub fn new(id: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn with_length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.valid_pattern = Some(pattern.into());
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_sub_form(mut self, form: Form) -> Self {
        self.sub_form = Some(Arc::new(form));
        self.sub_form_id = None;
        self
    }

    pub fn with_sub_form_id(mut self, id: impl Into<String>) -> Self {
        self.sub_form_id = Some(id.into());
        self.sub_form = None;
        self
    }

    pub fn with_alt_id(mut self, alt_id: impl Into<String>) -> Self {
        self.alt_id = Some(alt_id.into());
        self
    }

    pub fn with_alternate(mut self, alternate: Field) -> Self {
        self.alternates.push(alternate);
        self
    }

    /// The primary shape followed by every alternate.
    pub fn variants(&self) -> impl Iterator<Item = &Field> {
        std::iter::once(self).chain(self.alternates.iter())
    }

    /// Number of shapes this field accepts.
    pub fn variant_count(&self) -> usize {
        1 + self.alternates.len()
    }

    /// A field is required when any of its variants is.
    pub fn is_required_on_any_variant(&self) -> bool {
        self.variants().any(|v| v.is_required)
    }

    /// Whether the field describes its nested shape, owned or by name.
    pub fn has_sub_form(&self) -> bool {
        self.sub_form.is_some() || self.sub_form_id.is_some()
    }

    /// Whether any numeric, length or pattern constraint is declared.
    pub fn has_constraints(&self) -> bool {
        self.min_value.is_some()
            || self.max_value.is_some()
            || self.min_length.is_some()
            || self.max_length.is_some()
            || self.valid_pattern.is_some()
    }

    /// This field stripped of its alternates.
    pub fn without_alternates(&self) -> Field {
        Field {
            alternates: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether `value` is one of the declared choices.
    pub fn choice_matches(&self, value: &Value) -> bool {
        self.choices.iter().any(|c| c.matches(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_wire_shape() {
        let field: Field = serde_json::from_value(json!({
            "id": "luminance",
            "dataType": 0,
            "isRequired": true,
            "defaultValue": 0,
            "minValue": 0,
            "maxValue": 15
        }))
        .unwrap();
        assert_eq!(field.data_type, DataType::Int);
        assert!(field.is_required);
        assert_eq!(field.max_value, Some(15.0));
    }

    #[test]
    fn serialization_omits_unset_attributes() {
        let field = Field::new("name", DataType::String);
        let v = serde_json::to_value(&field).unwrap();
        assert_eq!(v, json!({"id": "name", "dataType": 40}));
    }

    #[test]
    fn required_on_any_variant() {
        let field = Field::new("f", DataType::String)
            .with_alternate(Field::new("f", DataType::Number).required());
        assert!(!field.is_required);
        assert!(field.is_required_on_any_variant());
        assert_eq!(field.variant_count(), 2);
    }

    #[test]
    fn sub_form_and_id_are_exclusive_in_builders() {
        let field = Field::new("f", DataType::Object)
            .with_sub_form_id("other")
            .with_sub_form(Form::new("inline"));
        assert!(field.sub_form.is_some());
        assert!(field.sub_form_id.is_none());
    }

    #[test]
    fn choice_matching_is_numeric_aware() {
        let field = Field::new("mode", DataType::IntEnum)
            .with_choices(vec![Choice::new("1"), Choice::new(2)]);
        assert!(field.choice_matches(&json!(1)));
        assert!(field.choice_matches(&json!(2)));
        assert!(!field.choice_matches(&json!(3)));
    }
}
