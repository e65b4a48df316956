//! Sub-form selection by `/`-separated field path.

use std::sync::Arc;

use formdef_core::{Field, Form, FormError, FormRegistry};

/// Walk `selector` from `form` and return the sub-form it names.
///
/// Each segment is a field id (or alt id). The first variant of that field
/// describing a nested shape is followed: an owned sub-form directly, a
/// `sub_form_id` through `registry`. An empty selector selects `form`.
///
/// A segment that does not resolve is an authoring error.
pub fn select_sub_form(
    form: &Arc<Form>,
    selector: &str,
    registry: &dyn FormRegistry,
) -> Result<Arc<Form>, FormError> {
    let mut current = Arc::clone(form);
    for segment in selector.split('/').filter(|s| !s.is_empty()) {
        let not_found = |reason: String| FormError::SubFormNotFound {
            form: form.display_id().to_string(),
            selector: selector.to_string(),
            segment: segment.to_string(),
            reason,
        };

        let field = current
            .field(segment)
            .ok_or_else(|| not_found(format!("form '{}' declares no such field", current.display_id())))?;
        let next = follow(field, registry).map_err(not_found)?;
        tracing::trace!(segment, form = %next.display_id(), "selected sub-form");
        current = next;
    }
    Ok(current)
}

fn follow(field: &Field, registry: &dyn FormRegistry) -> Result<Arc<Form>, String> {
    let Some(variant) = field.variants().find(|v| v.has_sub_form()) else {
        return Err(format!("field '{}' has no sub-form", field.id));
    };
    if let Some(sub) = &variant.sub_form {
        return Ok(Arc::clone(sub));
    }
    let id = variant.sub_form_id.as_deref().unwrap_or_default();
    registry
        .get_form(id)
        .ok_or_else(|| format!("sub-form id '{id}' is not registered"))
}
