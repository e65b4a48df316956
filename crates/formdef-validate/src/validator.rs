//! # Validator
//!
//! Walks arbitrary JSON against a [`Form`] and reports every mismatch as a
//! path-qualified [`Issue`]. Validation always runs to completion.
//!
//! ## Rules
//!
//! - A non-object value is checked against the form's scalar authority
//!   (see [`Form::scalar_authority`]); without one it is an
//!   [`IssueKind::UnexpectedScalar`]. The same shorthand applies to
//!   `object` fields whose sub-form has a scalar authority; elements of
//!   object arrays and keyed object collections must be objects.
//! - A declared field that is missing is an issue only when required on
//!   any variant.
//! - A present value must structurally match at least one variant. When
//!   several match, the value passes if any of them accepts it in depth;
//!   otherwise the first match's issues are reported.
//! - Undeclared keys are checked against the form's custom field, or
//!   reported as warnings when there is none. A field's own custom field
//!   describes the entries of an object that has no resolvable sub-form.
//! - Unresolved `sub_form_id` references are open objects.
//!
//! ## Constraints
//!
//! `min_value`/`max_value` apply to numeric tags, `min_length`/`max_length`
//! to strings (in characters) and arrays (in elements), `valid_pattern` to
//! strings, and `choices` to enum tags. Points and ranges are not bounded.
//! The schema compiler enforces the same set.

use std::collections::HashMap;
use std::sync::Arc;

use formdef_core::{DataType, Field, Form, FormRegistry};
use regex::Regex;
use serde_json::{Map, Value};

use crate::issue::{Issue, IssueKind, ScalarKind};
use crate::mismatch::{describe, get_data_mismatch_error};

/// Behavior switches for [`validate_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Check min/max, length, pattern and choice constraints.
    pub enforce_constraints: bool,
    /// Warn about keys neither declared nor covered by a custom field.
    pub report_unknown_properties: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            enforce_constraints: true,
            report_unknown_properties: true,
        }
    }
}

/// Validate `data` against `form` with default options.
pub fn validate(data: &Value, form: &Form, registry: &dyn FormRegistry) -> Vec<Issue> {
    validate_with(data, form, registry, &ValidationOptions::default())
}

/// Validate `data` against `form`.
pub fn validate_with(
    data: &Value,
    form: &Form,
    registry: &dyn FormRegistry,
    options: &ValidationOptions,
) -> Vec<Issue> {
    let mut walker = Walker {
        registry,
        options,
        patterns: HashMap::new(),
    };
    let mut issues = Vec::new();
    walker.form_value(data, form, "", &mut issues);
    tracing::debug!(form = %form.display_id(), issues = issues.len(), "validated data");
    issues
}

struct Walker<'a> {
    registry: &'a dyn FormRegistry,
    options: &'a ValidationOptions,
    /// Compiled `valid_pattern`s; `Err` holds the regex error text.
    patterns: HashMap<String, Result<Regex, String>>,
}

impl Walker<'_> {
    fn form_value(
        &mut self,
        value: &Value,
        form: &Form,
        path: &str,
        issues: &mut Vec<Issue>,
    ) {
        match value {
            Value::Object(map) => self.object(map, form, path, issues),
            _ => match form.scalar_authority() {
                Some(authority) => self.field_value(value, authority, path, issues),
                None => {
                    let kind = ScalarKind::of(value).unwrap_or(ScalarKind::Null);
                    issues.push(Issue::error(
                        path,
                        IssueKind::UnexpectedScalar { kind },
                        format!(
                            "expected an object for '{}' but found a {kind}",
                            form.display_id()
                        ),
                    ));
                }
            },
        }
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        form: &Form,
        path: &str,
        issues: &mut Vec<Issue>,
    ) {
        for field in &form.fields {
            let present = map
                .get(&field.id)
                .map(|v| (field.id.as_str(), v))
                .or_else(|| {
                    let alt = field.alt_id.as_deref()?;
                    map.get(alt).map(|v| (alt, v))
                });
            match present {
                Some((key, value)) => {
                    self.field_value(value, field, &format!("{path}/{key}"), issues)
                }
                None if field.is_required_on_any_variant() => issues.push(Issue::error(
                    format!("{path}/{}", field.id),
                    IssueKind::MissingRequired,
                    format!("missing required field '{}'", field.id),
                )),
                None => {}
            }
        }

        let catch_all = form.custom_field.as_deref();
        for (key, value) in map {
            if form.declares(key) {
                continue;
            }
            let key_path = format!("{path}/{key}");
            match catch_all {
                Some(custom) => self.field_value(value, custom, &key_path, issues),
                None if self.options.report_unknown_properties => issues.push(Issue::warning(
                    key_path,
                    IssueKind::UnknownProperty,
                    format!("unknown property '{key}' on '{}'", form.display_id()),
                )),
                None => {}
            }
        }
    }

    /// Check `value` against every variant of `field`.
    fn field_value(&mut self, value: &Value, field: &Field, path: &str, issues: &mut Vec<Issue>) {
        let mut first_mismatch = None;
        let mut first_match_issues: Option<Vec<Issue>> = None;

        for variant in field.variants() {
            let mut scratch = Vec::new();
            match get_data_mismatch_error(value, variant.data_type) {
                None => self.variant_value(value, variant, path, &mut scratch),
                Some(reason) => match self.scalar_shorthand(value, variant) {
                    Some(sub) => self.form_value(value, &sub, path, &mut scratch),
                    None => {
                        first_mismatch.get_or_insert(reason);
                        continue;
                    }
                },
            }
            if scratch.iter().all(|i| !i.is_error()) {
                issues.extend(scratch);
                return;
            }
            first_match_issues.get_or_insert(scratch);
        }

        if let Some(found) = first_match_issues {
            issues.extend(found);
            return;
        }

        let count = field.variant_count();
        if count == 1 {
            issues.push(Issue::error(
                path,
                IssueKind::TypeMismatch,
                first_mismatch.unwrap_or_else(|| format!("unexpected {}", describe(value))),
            ));
        } else {
            issues.push(Issue::error(
                path,
                IssueKind::NoMatchingAlternate { expected: count },
                format!("{} matches none of {count} expected types", describe(value)),
            ));
        }
    }

    /// Constraints and nested shapes for a structurally matching variant.
    fn variant_value(&mut self, value: &Value, variant: &Field, path: &str, issues: &mut Vec<Issue>) {
        if self.options.enforce_constraints {
            self.constraints(value, variant, path, issues);
        }

        let data_type = variant.data_type;
        let sub = self.resolve(variant);
        match (data_type, value) {
            (DataType::Object, Value::Object(map)) => match &sub {
                Some(sub) => self.object(map, sub, path, issues),
                None => self.open_object(map, variant, path, issues),
            },
            (DataType::KeyedObjectCollection, Value::Object(map)) => {
                if let Some(sub) = &sub {
                    for (key, element) in map {
                        self.form_value(element, sub, &format!("{path}/{key}"), issues);
                    }
                }
            }
            (DataType::ObjectArray, Value::Array(items)) => {
                if let Some(sub) = &sub {
                    for (i, element) in items.iter().enumerate() {
                        self.form_value(element, sub, &format!("{path}/{i}"), issues);
                    }
                }
            }
            _ => {}
        }
    }

    /// The sub-form of an `object` variant that lets a bare scalar stand in
    /// for the whole object.
    fn scalar_shorthand(&self, value: &Value, variant: &Field) -> Option<Arc<Form>> {
        if value.is_object() || variant.data_type != DataType::Object {
            return None;
        }
        self.resolve(variant)
            .filter(|sub| sub.scalar_authority().is_some())
    }

    /// An object field without a resolvable sub-form: only its custom
    /// field, if any, describes the entries.
    fn open_object(
        &mut self,
        map: &Map<String, Value>,
        variant: &Field,
        path: &str,
        issues: &mut Vec<Issue>,
    ) {
        if let Some(custom) = variant.custom_field.as_deref() {
            for (key, element) in map {
                self.field_value(element, custom, &format!("{path}/{key}"), issues);
            }
        }
    }

    fn resolve(&self, field: &Field) -> Option<Arc<Form>> {
        if let Some(sub) = &field.sub_form {
            return Some(Arc::clone(sub));
        }
        let id = field.sub_form_id.as_deref()?;
        let found = self.registry.get_form(id);
        if found.is_none() {
            tracing::debug!(field = %field.id, sub_form = %id, "unresolved sub-form; treating as open object");
        }
        found
    }

    fn constraints(&mut self, value: &Value, field: &Field, path: &str, issues: &mut Vec<Issue>) {
        let data_type = field.data_type;

        if data_type.is_numeric() {
            if let Some(n) = value.as_f64() {
                if let Some(min) = field.min_value.filter(|min| n < *min) {
                    issues.push(Issue::error(
                        path,
                        IssueKind::OutOfRange,
                        format!("value {value} is below the minimum {min}"),
                    ));
                }
                if let Some(max) = field.max_value.filter(|max| n > *max) {
                    issues.push(Issue::error(
                        path,
                        IssueKind::OutOfRange,
                        format!("value {value} is above the maximum {max}"),
                    ));
                }
            }
        }

        let length = match value {
            Value::String(s) if data_type.is_string() => Some(s.chars().count()),
            Value::Array(items) if data_type.is_array() => Some(items.len()),
            _ => None,
        };
        if let Some(len) = length {
            if let Some(min) = field.min_length.filter(|min| len < *min) {
                issues.push(Issue::error(
                    path,
                    IssueKind::InvalidLength,
                    format!("length {len} is shorter than the minimum {min}"),
                ));
            }
            if let Some(max) = field.max_length.filter(|max| len > *max) {
                issues.push(Issue::error(
                    path,
                    IssueKind::InvalidLength,
                    format!("length {len} is longer than the maximum {max}"),
                ));
            }
        }

        if let (Some(pattern), Some(s)) = (field.valid_pattern.as_deref(), value.as_str()) {
            if data_type.is_string() {
                let compiled = self
                    .patterns
                    .entry(pattern.to_string())
                    .or_insert_with(|| Regex::new(pattern).map_err(|e| e.to_string()));
                match compiled {
                    Ok(re) if !re.is_match(s) => issues.push(Issue::error(
                        path,
                        IssueKind::PatternMismatch,
                        format!("'{s}' does not match the pattern '{pattern}'"),
                    )),
                    Ok(_) => {}
                    Err(e) => issues.push(Issue::error(
                        path,
                        IssueKind::InvalidSchema,
                        format!("field '{}' has an invalid pattern: {e}", field.id),
                    )),
                }
            }
        }

        if data_type.is_enum() && !field.choices.is_empty() && !field.choice_matches(value) {
            issues.push(Issue::error(
                path,
                IssueKind::NotInChoices,
                format!("{value} is not one of the {} declared choices", field.choices.len()),
            ));
        }
    }
}
