//! # Any-Key Sentinel Fixup
//!
//! Generated fragments describe "any property name" with a field whose id
//! is [`ANY_KEY_SENTINEL`]. Such a field is not a literally named
//! property; this pass reinterprets it:
//!
//! - sole field of an object field's sub-form → the parent becomes the
//!   matching keyed collection (`keyedObjectCollection` keeps the
//!   sentinel's sub-form as its element shape);
//! - sole field of an array field's sub-form → the parent collapses to
//!   the array-of-element type (`molangExpression` → `molangExpressionArray`);
//! - next to named fields, or at the top of a form → it becomes the
//!   form's `custom_field` catch-all.
//!
//! Sentinels are removed as they are handled, so re-running is a no-op.

use std::sync::Arc;

use formdef_core::{Advisory, AdvisoryKind, DataType, Field, Form, ANY_KEY_SENTINEL};

/// Reinterpret any-key sentinel fields in `form` and every nested form.
///
/// `parent` is the field owning `form` as its sub-form, when there is one;
/// a sentinel that is the form's only field is promoted into it.
pub fn fixup_fields(form: &mut Form, parent: Option<&mut Field>) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let path = form.display_id().to_string();
    fixup_form(form, parent, &path, &mut advisories);
    advisories
}

/// Returns `true` when the sentinel was promoted into `parent`, which
/// means `form` no longer describes the parent's element shape.
fn fixup_form(
    form: &mut Form,
    parent: Option<&mut Field>,
    path: &str,
    advisories: &mut Vec<Advisory>,
) -> bool {
    for field in &mut form.fields {
        let field_path = format!("{path}/{}", field.id);
        fixup_field(field, &field_path, advisories);
        for alternate in &mut field.alternates {
            fixup_field(alternate, &field_path, advisories);
        }
    }

    if let Some(scalar) = form.scalar_field.as_deref_mut() {
        fixup_field(scalar, path, advisories);
    }
    if let Some(custom) = form.custom_field.as_deref_mut() {
        fixup_field(custom, path, advisories);
    }

    let (mut sentinels, named): (Vec<Field>, Vec<Field>) = std::mem::take(&mut form.fields)
        .into_iter()
        .partition(|f| f.id == ANY_KEY_SENTINEL);
    form.fields = named;
    if sentinels.is_empty() {
        return false;
    }
    let sentinel = sentinels.remove(0);
    for extra in sentinels {
        advisories.push(Advisory::record(
            AdvisoryKind::DuplicateField,
            path,
            format!("dropped extra any-key sentinel of type '{}'", extra.data_type),
        ));
    }

    match parent {
        Some(parent) if form.fields.is_empty() => {
            promote_into_parent(parent, sentinel);
            true
        }
        _ => {
            if form.custom_field.is_some() {
                advisories.push(Advisory::record(
                    AdvisoryKind::DuplicateField,
                    path,
                    "any-key sentinel dropped; form already declares a custom field",
                ));
            } else {
                let mut custom = sentinel;
                custom.id = ANY_KEY_SENTINEL.to_string();
                form.custom_field = Some(Box::new(custom));
            }
            false
        }
    }
}

fn fixup_field(field: &mut Field, path: &str, advisories: &mut Vec<Advisory>) {
    if let Some(mut sub) = field.sub_form.take() {
        let promoted = fixup_form(Arc::make_mut(&mut sub), Some(&mut *field), path, advisories);
        if !promoted {
            field.sub_form = Some(sub);
        }
    }
    if let Some(custom) = field.custom_field.as_deref_mut() {
        fixup_field(custom, path, advisories);
    }
}

fn promote_into_parent(parent: &mut Field, sentinel: Field) {
    let element = sentinel.data_type;
    let element_has_shape = element.takes_sub_form() || sentinel.has_sub_form();

    if parent.data_type.is_array() {
        match element.array_of() {
            Some(array) if !element_has_shape => {
                parent.data_type = array;
                parent.sub_form = None;
                parent.sub_form_id = None;
            }
            _ => {
                parent.data_type = DataType::ObjectArray;
                parent.sub_form = sentinel.sub_form;
                parent.sub_form_id = sentinel.sub_form_id;
            }
        }
        return;
    }

    if element_has_shape {
        parent.data_type = DataType::KeyedObjectCollection;
        parent.sub_form = sentinel.sub_form;
        parent.sub_form_id = sentinel.sub_form_id;
    } else {
        parent.data_type = element
            .keyed_collection_of()
            .unwrap_or(DataType::KeyedObjectCollection);
        parent.sub_form = None;
        parent.sub_form_id = None;
    }
    if parent.description.is_none() {
        parent.description = sentinel.description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinel(t: DataType) -> Field {
        Field::new(ANY_KEY_SENTINEL, t)
    }

    #[test]
    fn object_with_sole_string_sentinel_becomes_keyed_string_collection() {
        let mut form = Form::new("x").with_field(
            Field::new("names", DataType::Object)
                .with_sub_form(Form::anonymous().with_field(sentinel(DataType::String))),
        );
        fixup_fields(&mut form, None);
        let names = form.field("names").unwrap();
        assert_eq!(names.data_type, DataType::KeyedStringCollection);
        assert!(names.sub_form.is_none());
    }

    #[test]
    fn object_sentinel_with_shape_becomes_keyed_object_collection() {
        let element = Form::anonymous().with_field(Field::new("event", DataType::String));
        let mut form = Form::new("x").with_field(
            Field::new("events", DataType::Object).with_sub_form(
                Form::anonymous().with_field(sentinel(DataType::Object).with_sub_form(element)),
            ),
        );
        fixup_fields(&mut form, None);
        let events = form.field("events").unwrap();
        assert_eq!(events.data_type, DataType::KeyedObjectCollection);
        let shape = events.sub_form.as_ref().unwrap();
        assert_eq!(shape.fields[0].id, "event");
    }

    #[test]
    fn array_with_sole_molang_sentinel_collapses() {
        let mut form = Form::new("x").with_field(
            Field::new("expressions", DataType::ObjectArray)
                .with_sub_form(Form::anonymous().with_field(sentinel(DataType::MolangExpression))),
        );
        fixup_fields(&mut form, None);
        let f = form.field("expressions").unwrap();
        assert_eq!(f.data_type, DataType::MolangExpressionArray);
        assert!(f.sub_form.is_none());
    }

    #[test]
    fn sentinel_beside_named_fields_becomes_custom_field() {
        let mut form = Form::new("x").with_field(
            Field::new("states", DataType::Object).with_sub_form(
                Form::anonymous()
                    .with_field(Field::new("fixed", DataType::Boolean))
                    .with_field(sentinel(DataType::Int)),
            ),
        );
        fixup_fields(&mut form, None);
        let states = form.field("states").unwrap();
        assert_eq!(states.data_type, DataType::Object);
        let sub = states.sub_form.as_ref().unwrap();
        assert_eq!(sub.fields.len(), 1);
        assert_eq!(sub.custom_field.as_ref().map(|c| c.data_type), Some(DataType::Int));
    }

    #[test]
    fn top_level_sentinel_becomes_custom_field() {
        let mut form = Form::new("x").with_field(sentinel(DataType::Boolean));
        fixup_fields(&mut form, None);
        assert!(form.fields.is_empty());
        assert!(form.custom_field.is_some());
    }

    #[test]
    fn explicit_parent_receives_promotion() {
        let mut parent = Field::new("tags", DataType::Object);
        let mut form = Form::anonymous().with_field(sentinel(DataType::Boolean));
        fixup_fields(&mut form, Some(&mut parent));
        assert_eq!(parent.data_type, DataType::KeyedBooleanCollection);
        assert!(form.fields.is_empty());
    }

    #[test]
    fn fixup_is_idempotent() {
        let mut form = Form::new("x")
            .with_field(
                Field::new("names", DataType::Object)
                    .with_sub_form(Form::anonymous().with_field(sentinel(DataType::String))),
            )
            .with_field(sentinel(DataType::Int));
        fixup_fields(&mut form, None);
        let once = form.clone();
        fixup_fields(&mut form, None);
        assert_eq!(form, once);
    }
}
