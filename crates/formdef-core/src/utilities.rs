//! # Field Utilities
//!
//! Pure reads over forms and live values: field value lookup, display
//! titles and condition evaluation.

use serde_json::Value;

use crate::condition::Condition;
use crate::container::ValueSource;
use crate::error::FormError;
use crate::field::Field;
use crate::form::Form;

/// Read the value for `field.id`, falling back to `field.alt_id`.
///
/// Returns `None` when the source holds neither key.
pub fn get_field_value(field: &Field, source: &dyn ValueSource) -> Option<Value> {
    source
        .read(&field.id)
        .or_else(|| field.alt_id.as_deref().and_then(|alt| source.read(alt)))
}

/// The display title of a field: its `title`, or its humanized id.
pub fn field_title(field: &Field) -> String {
    match field.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => humanize_id(&field.id),
    }
}

/// Turn an identifier into a display title.
///
/// Drops a `namespace:` prefix, splits on `_`, `-`, `.`, spaces and
/// camelCase boundaries, and capitalizes each word:
/// `minecraft:is_solid` → `Is Solid`, `maxHealth` → `Max Health`.
pub fn humanize_id(id: &str) -> String {
    let base = id.rsplit(':').next().unwrap_or(id);
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in base.chars() {
        if matches!(ch, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `s` is a dotted run of decimal numbers, such as `1.20.0`.
pub fn is_version_string(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Evaluate every condition against `source`; true only if all hold.
///
/// Each condition's field is resolved on `form`. When it is not declared,
/// `default_field` stands in and the value is read under the condition's
/// own key. With no default field an unresolvable name is an authoring
/// error and fails loudly.
///
/// An absent value falls back to the field's `default_value`.
pub fn evaluate(
    form: &Form,
    conditions: &[Condition],
    source: &dyn ValueSource,
    default_field: Option<&Field>,
) -> Result<bool, FormError> {
    for condition in conditions {
        let actual = match form.field(&condition.field) {
            Some(field) => get_field_value(field, source).or_else(|| field.default_value.clone()),
            None => {
                let fallback = default_field.ok_or_else(|| FormError::UnknownConditionField {
                    form: form.display_id().to_string(),
                    field: condition.field.clone(),
                })?;
                source
                    .read(&condition.field)
                    .or_else(|| fallback.default_value.clone())
            }
        };
        if !condition.holds(actual.as_ref())? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The primary fields whose visibility conditions hold for `source`.
pub fn visible_fields<'f>(
    form: &'f Form,
    source: &dyn ValueSource,
) -> Result<Vec<&'f Field>, FormError> {
    let mut visible = Vec::with_capacity(form.fields.len());
    for field in &form.fields {
        if evaluate(form, &field.visibility_conditions, source, None)? {
            visible.push(field);
        }
    }
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Comparison, DataType};
    use serde_json::json;

    fn light_block() -> Form {
        Form::new("block_light_block")
            .with_field(
                Field::new("luminance", DataType::Int)
                    .with_range(Some(0.0), Some(15.0))
                    .with_default(0),
            )
            .with_field(Field::new("is_solid", DataType::Boolean).with_default(true))
    }

    #[test]
    fn get_field_value_prefers_id_then_alt_id() {
        let field = Field::new("new", DataType::Int).with_alt_id("old");
        assert_eq!(get_field_value(&field, &json!({"new": 1, "old": 2})), Some(json!(1)));
        assert_eq!(get_field_value(&field, &json!({"old": 2})), Some(json!(2)));
        assert_eq!(get_field_value(&field, &json!({})), None);
    }

    #[test]
    fn humanize_examples() {
        assert_eq!(humanize_id("minecraft:is_solid"), "Is Solid");
        assert_eq!(humanize_id("maxHealth"), "Max Health");
        assert_eq!(humanize_id("on-hit.event"), "On Hit Event");
        assert_eq!(humanize_id(""), "");
    }

    #[test]
    fn field_title_uses_title_when_present() {
        assert_eq!(field_title(&Field::new("x_y", DataType::Int)), "X Y");
        assert_eq!(field_title(&Field::new("x_y", DataType::Int).with_title("Custom")), "Custom");
        assert_eq!(field_title(&Field::new("x_y", DataType::Int).with_title("  ")), "X Y");
    }

    #[test]
    fn evaluate_all_conditions() {
        let form = light_block();
        let data = json!({"luminance": 8});
        let conditions = vec![
            Condition::new("luminance", Comparison::GreaterThan).with_value(4),
            Condition::equals("is_solid", true),
        ];
        // is_solid absent → default true.
        assert!(evaluate(&form, &conditions, &data, None).unwrap());

        let off = json!({"luminance": 8, "is_solid": false});
        assert!(!evaluate(&form, &conditions, &off, None).unwrap());
    }

    #[test]
    fn unknown_condition_field_fails_loud() {
        let form = light_block();
        let conditions = vec![Condition::equals("nope", 1)];
        let err = evaluate(&form, &conditions, &json!({}), None).unwrap_err();
        assert!(matches!(err, FormError::UnknownConditionField { ref field, .. } if field == "nope"));
    }

    #[test]
    fn default_field_stands_in_for_unknown_names() {
        let form = light_block();
        let fallback = Field::new("*", DataType::String).with_default("b");
        let conditions = vec![Condition::equals("mode", "b")];
        assert!(evaluate(&form, &conditions, &json!({}), Some(&fallback)).unwrap());
        assert!(!evaluate(&form, &conditions, &json!({"mode": "a"}), Some(&fallback)).unwrap());
    }

    #[test]
    fn visible_fields_filters_by_conditions() {
        let mut form = light_block();
        form.fields[0].visibility_conditions = vec![Condition::equals("is_solid", true)];
        let shown = visible_fields(&form, &json!({"is_solid": false})).unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, "is_solid");
    }
}
