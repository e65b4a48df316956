//! # Field Merge
//!
//! Folds a `fields` list that may hold several entries sharing an `id`
//! into one primary per id plus a flat `alternates` list, then orders the
//! variants of each id so the primary is the most structured shape.
//!
//! ## Primary selection order
//!
//! 1. Fields with a sub-form (owned or by id) before fields without.
//! 2. Complex data types (objects, arrays, collections) before scalars.
//! 3. Lower numeric data-type tag first.
//!
//! Ties keep their incoming order (stable sort), which is what makes the
//! pass idempotent: re-sorting an already sorted variant list is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use formdef_core::{Advisory, AdvisoryKind, Field, Form};

/// Fold duplicate field ids into primary + alternates, recursively.
///
/// An incoming field's own alternates are spliced into the flat list,
/// never nested. A variant structurally identical to one already kept is
/// dropped with a [`AdvisoryKind::DuplicateField`] advisory. Finishes with
/// [`sort_and_clean_alternate_fields`].
pub fn merge_fields(form: &mut Form) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let path = form.display_id().to_string();
    merge_form(form, &path, &mut advisories);
    sort_and_clean_alternate_fields(form);
    advisories
}

fn merge_form(form: &mut Form, path: &str, advisories: &mut Vec<Advisory>) {
    if form.ensure_scalar_authority() {
        advisories.push(Advisory::record(
            AdvisoryKind::ScalarAuthorityConflict,
            path,
            "both scalarField and scalarFieldUpgradeName set; keeping the upgrade name",
        ));
    }

    let incoming = std::mem::take(&mut form.fields);
    let mut merged: Vec<Field> = Vec::with_capacity(incoming.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for mut field in incoming {
        let spliced = std::mem::take(&mut field.alternates);
        let slot = match index.get(&field.id) {
            Some(&i) => {
                absorb(&mut merged[i], field, path, advisories);
                i
            }
            None => {
                index.insert(field.id.clone(), merged.len());
                merged.push(field);
                merged.len() - 1
            }
        };
        for alternate in spliced {
            absorb(&mut merged[slot], alternate, path, advisories);
        }
    }

    for field in &mut merged {
        let field_path = format!("{path}/{}", field.id);
        merge_field_children(field, &field_path, advisories);
        for alternate in &mut field.alternates {
            merge_field_children(alternate, &field_path, advisories);
        }
    }
    form.fields = merged;

    if let Some(scalar) = form.scalar_field.as_deref_mut() {
        merge_field_children(scalar, &format!("{path}/(scalar)"), advisories);
    }
    if let Some(custom) = form.custom_field.as_deref_mut() {
        merge_field_children(custom, &format!("{path}/(custom)"), advisories);
    }
}

/// Add `variant` (and any alternates it carries) to `primary`'s list.
fn absorb(primary: &mut Field, mut variant: Field, path: &str, advisories: &mut Vec<Advisory>) {
    let nested = std::mem::take(&mut variant.alternates);

    let duplicate = variant == primary.without_alternates()
        || primary.alternates.iter().any(|a| *a == variant);
    if duplicate {
        advisories.push(Advisory::record(
            AdvisoryKind::DuplicateField,
            format!("{path}/{}", variant.id),
            format!("dropped duplicate '{}' variant", variant.data_type),
        ));
    } else {
        primary.alternates.push(variant);
    }

    for alternate in nested {
        absorb(primary, alternate, path, advisories);
    }
}

fn merge_field_children(field: &mut Field, path: &str, advisories: &mut Vec<Advisory>) {
    if field.sub_form.is_some() && field.sub_form_id.is_some() {
        advisories.push(Advisory::record(
            AdvisoryKind::SubFormConflict,
            path,
            "field has both subForm and subFormId; keeping the owned subForm",
        ));
        field.sub_form_id = None;
    }
    if let Some(sub) = field.sub_form.as_mut() {
        merge_form(Arc::make_mut(sub), path, advisories);
    }
    if let Some(custom) = field.custom_field.as_deref_mut() {
        merge_field_children(custom, &format!("{path}/(custom)"), advisories);
    }
}

/// Choose the primary among each field's variants and tidy alternates.
///
/// Non-primary variants become `alternates`; an alternate whose title
/// textually matches the primary's loses its own title, and a primary
/// with no description inherits the first alternate's. Recurses into every
/// sub-form, including alternates' sub-forms.
pub fn sort_and_clean_alternate_fields(form: &mut Form) {
    for field in &mut form.fields {
        // Children first: variants are compared structurally afterwards.
        sort_field_children(field);
        for alternate in &mut field.alternates {
            sort_field_children(alternate);
        }
        sort_field_variants(field);
    }
    if let Some(scalar) = form.scalar_field.as_deref_mut() {
        sort_field_children(scalar);
    }
    if let Some(custom) = form.custom_field.as_deref_mut() {
        sort_field_children(custom);
    }
}

fn sort_field_children(field: &mut Field) {
    if let Some(sub) = field.sub_form.as_mut() {
        sort_and_clean_alternate_fields(Arc::make_mut(sub));
    }
    if let Some(custom) = field.custom_field.as_deref_mut() {
        sort_field_children(custom);
    }
}

/// Sort key implementing the primary selection order.
fn variant_rank(field: &Field) -> (u8, u8, u16) {
    (
        u8::from(!field.has_sub_form()),
        u8::from(!field.data_type.is_complex()),
        field.data_type.tag(),
    )
}

fn sort_field_variants(field: &mut Field) {
    if field.alternates.is_empty() {
        return;
    }

    let mut variants: Vec<Field> = Vec::with_capacity(field.variant_count());
    let rest = std::mem::take(&mut field.alternates);
    variants.push(std::mem::take(field));
    for mut alternate in rest {
        let nested = std::mem::take(&mut alternate.alternates);
        variants.push(alternate);
        variants.extend(nested);
    }
    variants.sort_by_key(variant_rank);

    let mut primary = variants.remove(0);
    let primary_title = primary.title.as_deref().map(normalize_title);
    for alternate in &mut variants {
        if primary_title.is_some() && alternate.title.as_deref().map(normalize_title) == primary_title {
            alternate.title = None;
        }
    }
    if primary.description.is_none() {
        primary.description = variants.iter().find_map(|v| v.description.clone());
    }

    // Cleaning can make variants identical; keep one of each.
    let mut kept: Vec<Field> = Vec::with_capacity(variants.len());
    for variant in variants {
        if variant != primary && !kept.contains(&variant) {
            kept.push(variant);
        }
    }
    primary.alternates = kept;
    *field = primary;
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdef_core::DataType;

    fn f(id: &str, t: DataType) -> Field {
        Field::new(id, t)
    }

    #[test]
    fn duplicates_fold_into_alternates() {
        let mut form = Form::new("x")
            .with_field(f("a", DataType::String))
            .with_field(f("b", DataType::Int))
            .with_field(f("a", DataType::Number))
            .with_field(f("a", DataType::Object));
        merge_fields(&mut form);

        assert_eq!(form.fields.len(), 2);
        let a = form.field("a").unwrap();
        // Complex object wins over scalars; scalars follow by tag.
        assert_eq!(a.data_type, DataType::Object);
        let alts: Vec<DataType> = a.alternates.iter().map(|f| f.data_type).collect();
        assert_eq!(alts, vec![DataType::Number, DataType::String]);
        // Incoming order of distinct ids is preserved.
        assert_eq!(form.fields[0].id, "a");
        assert_eq!(form.fields[1].id, "b");
    }

    #[test]
    fn sub_form_owner_beats_complex_without_sub_form() {
        let mut form = Form::new("x")
            .with_field(f("a", DataType::KeyedStringCollection))
            .with_field(f("a", DataType::Object).with_sub_form(Form::anonymous()));
        merge_fields(&mut form);
        let a = form.field("a").unwrap();
        assert_eq!(a.data_type, DataType::Object);
        assert_eq!(a.alternates[0].data_type, DataType::KeyedStringCollection);
    }

    #[test]
    fn incoming_alternates_are_spliced_flat() {
        let nested = f("a", DataType::String)
            .with_alternate(f("a", DataType::Boolean).with_alternate(f("a", DataType::Int)));
        let mut form = Form::new("x").with_field(f("a", DataType::Number)).with_field(nested);
        merge_fields(&mut form);
        let a = form.field("a").unwrap();
        assert_eq!(a.variant_count(), 4);
        assert!(a.alternates.iter().all(|alt| alt.alternates.is_empty()));
    }

    #[test]
    fn identical_duplicates_are_dropped_with_advisory() {
        let mut form = Form::new("x")
            .with_field(f("a", DataType::String))
            .with_field(f("a", DataType::String));
        let advisories = merge_fields(&mut form);
        assert_eq!(form.fields.len(), 1);
        assert!(form.fields[0].alternates.is_empty());
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].kind, AdvisoryKind::DuplicateField);
    }

    #[test]
    fn matching_titles_cleared_and_description_inherited() {
        let mut form = Form::new("x")
            .with_field(f("a", DataType::String).with_title("Amount ").with_description("How much."))
            .with_field(f("a", DataType::IntRange).with_title("amount"));
        merge_fields(&mut form);
        let a = form.field("a").unwrap();
        assert_eq!(a.data_type, DataType::IntRange);
        assert_eq!(a.title.as_deref(), Some("amount"));
        assert_eq!(a.description.as_deref(), Some("How much."));
        assert!(a.alternates[0].title.is_none());
    }

    #[test]
    fn recurses_into_sub_forms_and_alternate_sub_forms() {
        let inner = Form::anonymous()
            .with_field(f("z", DataType::String))
            .with_field(f("z", DataType::Int));
        let mut form = Form::new("x").with_field(
            f("a", DataType::String).with_alternate(f("a", DataType::Object).with_sub_form(inner.clone())),
        );
        merge_fields(&mut form);
        let a = form.field("a").unwrap();
        assert_eq!(a.data_type, DataType::Object);
        let sub = a.sub_form.as_ref().unwrap();
        assert_eq!(sub.fields.len(), 1);
        assert_eq!(sub.fields[0].alternates.len(), 1);
    }

    #[test]
    fn sub_form_conflict_keeps_owned() {
        let mut field = f("a", DataType::Object).with_sub_form(Form::anonymous());
        field.sub_form_id = Some("other".into());
        let mut form = Form::new("x").with_field(field);
        let advisories = merge_fields(&mut form);
        assert!(form.fields[0].sub_form.is_some());
        assert!(form.fields[0].sub_form_id.is_none());
        assert!(advisories.iter().any(|a| a.kind == AdvisoryKind::SubFormConflict));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut form = Form::new("x")
            .with_field(f("a", DataType::String).with_title("A"))
            .with_field(f("a", DataType::Object).with_title("A"))
            .with_field(f("a", DataType::Boolean).with_alternate(f("a", DataType::StringArray)));
        merge_fields(&mut form);
        let once = form.clone();
        let advisories = merge_fields(&mut form);
        assert_eq!(form, once);
        assert!(advisories.is_empty());
    }
}
