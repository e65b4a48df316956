//! # Empty-Object Pruning
//!
//! A zero-key object stored under a field flagged `undefined_if_empty`
//! means "not set" and is removed from the data. Event triggers and
//! filter expressions are always treated that way: an empty trigger or
//! filter has no meaning, whatever the flag says.

use std::sync::Arc;

use formdef_core::{Advisory, AdvisoryKind, DataType, Field, Form, FormRegistry};
use serde_json::{Map, Value};

/// Remove empty object values that should be absent, recursively.
///
/// Walks `data` along `form`'s declared fields, descending into owned and
/// registry-resolved sub-forms for objects, object arrays and keyed
/// object collections. Each removal is reported as an
/// [`AdvisoryKind::EmptyObjectOmitted`] advisory.
pub fn prune_empty_objects(form: &Form, data: &mut Value, registry: &dyn FormRegistry) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if let Value::Object(map) = data {
        prune_object(form, map, "", registry, &mut advisories);
    }
    advisories
}

fn collapses_when_empty(field: &Field) -> bool {
    field.variants().any(|v| {
        v.undefined_if_empty
            || matches!(v.data_type, DataType::EventTrigger | DataType::FilterExpression)
    })
}

fn prune_object(
    form: &Form,
    map: &mut Map<String, Value>,
    path: &str,
    registry: &dyn FormRegistry,
    advisories: &mut Vec<Advisory>,
) {
    for field in &form.fields {
        let key = if map.contains_key(&field.id) {
            field.id.as_str()
        } else {
            match field.alt_id.as_deref() {
                Some(alt) if map.contains_key(alt) => alt,
                _ => continue,
            }
        };
        let field_path = format!("{path}/{key}");

        let empty = matches!(map.get(key), Some(Value::Object(o)) if o.is_empty());
        if empty && collapses_when_empty(field) {
            map.remove(key);
            advisories.push(Advisory::record(
                AdvisoryKind::EmptyObjectOmitted,
                field_path,
                "empty object removed",
            ));
            continue;
        }

        if let Some(value) = map.get_mut(key) {
            prune_value(field, value, &field_path, registry, advisories);
        }
    }
}

fn prune_value(
    field: &Field,
    value: &mut Value,
    path: &str,
    registry: &dyn FormRegistry,
    advisories: &mut Vec<Advisory>,
) {
    match value {
        Value::Object(map) => {
            if let Some(sub) = shape_for(field, DataType::Object, registry) {
                prune_object(&sub, map, path, registry, advisories);
            } else if let Some(sub) = shape_for(field, DataType::KeyedObjectCollection, registry) {
                for (key, element) in map.iter_mut() {
                    if let Value::Object(inner) = element {
                        prune_object(&sub, inner, &format!("{path}/{key}"), registry, advisories);
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(sub) = shape_for(field, DataType::ObjectArray, registry) {
                for (i, element) in items.iter_mut().enumerate() {
                    if let Value::Object(inner) = element {
                        prune_object(&sub, inner, &format!("{path}/{i}"), registry, advisories);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Sub-form of the first variant with data type `kind`, if resolvable.
fn shape_for(field: &Field, kind: DataType, registry: &dyn FormRegistry) -> Option<Arc<Form>> {
    field
        .variants()
        .filter(|v| v.data_type == kind)
        .find_map(|v| match (&v.sub_form, &v.sub_form_id) {
            (Some(sub), _) => Some(Arc::clone(sub)),
            (None, Some(id)) => registry.get_form(id),
            (None, None) => None,
        })
}
