//! # Form Model
//!
//! An ordered, named set of [`Field`]s plus form-level metadata.
//!
//! A form may declare that the whole value can alternatively be a bare
//! scalar. Two authorities exist for that: the legacy `scalar_field`
//! (a standalone field definition) and `scalar_field_upgrade_name` (the id
//! of the field the scalar upgrades into). They are mutually exclusive;
//! when both appear the upgrade name wins.
//!
//! The two `*_doNotEdit` keys are generator-only staging areas holding
//! machine-generated fragments pending merge against hand-authored
//! content. A form is final only once both are stripped.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::Field;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Named, versioned schema for one structured JSON object type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<Field>,

    /// The whole value may alternatively be this bare scalar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar_field: Option<Box<Field>>,

    /// Id of the field a bare scalar value upgrades into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar_field_upgrade_name: Option<String>,

    /// Catch-all describing values of undeclared property names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_field: Option<Box<Field>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deprecated: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_internal: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Documentation-only example documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Value>,

    /// Staging: fragment generated from legacy documentation.
    #[serde(
        rename = "generated_doNotEdit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub generated: Option<Box<Form>>,

    /// Staging: fragment generated from the interchange schema catalog.
    #[serde(
        rename = "generatedFromSchema_doNotEdit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_from_schema: Option<Box<Form>>,
}

impl Form {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// An anonymous form, typically an inline sub-form.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_scalar_field(mut self, field: Field) -> Self {
        self.scalar_field = Some(Box::new(field));
        self
    }

    pub fn with_custom_field(mut self, field: Field) -> Self {
        self.custom_field = Some(Box::new(field));
        self
    }

    /// Wrap into the shared handle used for sub-forms and registries.
    pub fn into_shared(self) -> Arc<Form> {
        Arc::new(self)
    }

    /// Id for messages and logs.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("(anonymous)")
    }

    /// Look up a primary field by `id`, falling back to `alt_id`.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .or_else(|| self.fields.iter().find(|f| f.alt_id.as_deref() == Some(id)))
    }

    pub fn field_mut(&mut self, id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Whether `key` names a declared field (by id or alt id).
    pub fn declares(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// The field a bare scalar value is checked against.
    ///
    /// `scalar_field_upgrade_name` wins when it names a declared field;
    /// otherwise `scalar_field` is used.
    pub fn scalar_authority(&self) -> Option<&Field> {
        if let Some(name) = &self.scalar_field_upgrade_name {
            if let Some(field) = self.field(name) {
                return Some(field);
            }
        }
        self.scalar_field.as_deref()
    }

    /// Drop `scalar_field` when an upgrade name is also present.
    /// Returns `true` when a conflict was resolved.
    pub fn ensure_scalar_authority(&mut self) -> bool {
        if self.scalar_field_upgrade_name.is_some() && self.scalar_field.is_some() {
            self.scalar_field = None;
            return true;
        }
        false
    }

    /// Whether either generator staging key is populated.
    pub fn has_staging(&self) -> bool {
        self.generated.is_some() || self.generated_from_schema.is_some()
    }

    /// Remove both staging keys, returning `(generated, generated_from_schema)`.
    pub fn take_staging(&mut self) -> (Option<Box<Form>>, Option<Box<Form>>) {
        (self.generated.take(), self.generated_from_schema.take())
    }
}
