//! # Interchange Schema Catalog
//!
//! Converts named nodes of a JSON-Schema-like interchange catalog into
//! form fragments.
//!
//! ## Conversion
//!
//! - Object nodes become forms; their properties become fields and
//!   `additionalProperties` becomes an any-key sentinel field, which the
//!   merge engine's fixup later turns into a custom field or a keyed
//!   collection.
//! - Array nodes become array fields whose sub-form holds one sentinel
//!   field describing the element.
//! - `anyOf` / `oneOf` unions are emitted as several fields sharing one
//!   id; merging folds them into a primary plus alternates.
//! - `$ref`s to other named nodes are expanded inline.
//!
//! ## Dependency cycles
//!
//! Expansion keeps the stack of node ids currently being expanded. A
//! `$ref` to an id already on the stack is not expanded again: it is
//! recorded as a [`AdvisoryKind::DependencyCycle`] advisory and emitted as
//! a by-id `sub_form_id` link, which every consumer resolves lazily.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use formdef_core::{Advisory, AdvisoryKind, Choice, DataType, Field, Form, ANY_KEY_SENTINEL};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;

/// A `type` keyword: one name or a list of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    One(String),
    Many(Vec<String>),
}

impl TypeSet {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// `additionalProperties`: a flag or a schema for undeclared keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<SchemaNode>),
}

/// One node of the interchange catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(default, rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<TypeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Additional>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

impl SchemaNode {
    fn types(&self) -> Vec<&str> {
        self.node_type.as_ref().map(TypeSet::names).unwrap_or_default()
    }

    fn union(&self) -> &[SchemaNode] {
        if self.any_of.is_empty() {
            &self.one_of
        } else {
            &self.any_of
        }
    }

    fn extra_schema(&self) -> Option<&SchemaNode> {
        match &self.additional_properties {
            Some(Additional::Schema(node)) => Some(node),
            _ => None,
        }
    }

    fn is_object(&self) -> bool {
        self.types().contains(&"object") || !self.properties.is_empty() || self.extra_schema().is_some()
    }
}

/// Named schema nodes, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default)]
    pub definitions: BTreeMap<String, SchemaNode>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog document. Nested `definitions` of a node are
    /// hoisted into the catalog under their own names.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut catalog: Self = serde_json::from_value(value)?;
        let mut nested = Vec::new();
        for node in catalog.definitions.values_mut() {
            collect_definitions(node, &mut nested);
        }
        for (name, node) in nested {
            catalog.definitions.entry(name).or_insert(node);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_value(value).map_err(|source| ImportError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), nodes = catalog.len(), "loaded schema catalog");
        Ok(catalog)
    }

    pub fn insert(&mut self, id: impl Into<String>, node: SchemaNode) {
        self.definitions.insert(id.into(), node);
    }

    pub fn get(&self, id: &str) -> Option<&SchemaNode> {
        self.definitions.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn collect_definitions(node: &mut SchemaNode, out: &mut Vec<(String, SchemaNode)>) {
    for (name, mut child) in std::mem::take(&mut node.definitions) {
        collect_definitions(&mut child, out);
        out.push((name, child));
    }
}

/// `#/definitions/foo` → `foo`.
fn ref_target(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn inferred_type(node: &SchemaNode) -> Option<&'static str> {
    if node.is_object() {
        return Some("object");
    }
    if node.items.is_some() {
        return Some("array");
    }
    match node.enum_values.first()? {
        Value::String(_) => Some("string"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        Value::Bool(_) => Some("boolean"),
        _ => None,
    }
}

/// Expands catalog nodes into form fragments.
pub struct CatalogImporter<'a> {
    catalog: &'a SchemaCatalog,
    stack: Vec<String>,
    /// Loops already reported, each rotated to start at its smallest id.
    reported: HashSet<Vec<String>>,
    advisories: Vec<Advisory>,
}

impl<'a> CatalogImporter<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            stack: Vec::new(),
            reported: HashSet::new(),
            advisories: Vec::new(),
        }
    }

    /// The form fragment for the node named `id`, if the catalog has it.
    pub fn import(&mut self, id: &str) -> Option<Form> {
        let node = self.catalog.get(id)?;
        let mut form = Form::new(id);
        form.title = node.title.clone();
        form.description = node.description.clone();
        form.is_deprecated = node.deprecated;

        self.stack.push(id.to_string());
        self.form_body(node, &mut form);
        self.stack.pop();

        tracing::debug!(form = %id, fields = form.fields.len(), "imported catalog node");
        Some(form)
    }

    /// Fragments for every node in the catalog.
    pub fn import_all(&mut self) -> Vec<Form> {
        let catalog = self.catalog;
        catalog.ids().filter_map(|id| self.import(id)).collect()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }

    /// Enter `target` unless it is already being expanded. A loop is
    /// reported once however many of its nodes the walk starts from.
    fn enter(&mut self, target: &str) -> Option<&'a SchemaNode> {
        if let Some(start) = self.stack.iter().position(|id| id == target) {
            let mut cycle = self.stack[start..].to_vec();
            if let Some(min) = cycle.iter().enumerate().min_by(|a, b| a.1.cmp(b.1)).map(|(i, _)| i) {
                cycle.rotate_left(min);
            }
            if self.reported.insert(cycle) {
                let chain = self.stack.join(" -> ");
                self.advisories.push(Advisory::record(
                    AdvisoryKind::DependencyCycle,
                    target,
                    format!("{chain} -> {target} returns to a node being expanded; linked by id"),
                ));
            } else {
                tracing::debug!(node = %target, "dependency cycle already reported");
            }
            return None;
        }
        let Some(node) = self.catalog.get(target) else {
            self.advisories.push(Advisory::record(
                AdvisoryKind::UnresolvedReference,
                target,
                format!("reference to unknown node '{target}'"),
            ));
            return None;
        };
        self.stack.push(target.to_string());
        Some(node)
    }

    /// Fill `form` with the fields (or scalar shape) `node` describes.
    fn form_body(&mut self, node: &SchemaNode, form: &mut Form) {
        if let Some(reference) = &node.reference {
            let target = ref_target(reference);
            if let Some(resolved) = self.enter(target) {
                self.form_body(resolved, form);
                self.stack.pop();
            }
            return;
        }
        if !node.union().is_empty() {
            for member in node.union() {
                self.form_body(member, form);
            }
            return;
        }
        if node.is_object() {
            for (name, property) in &node.properties {
                let required = node.required.iter().any(|r| r == name);
                self.fields(name, property, required, None, &mut form.fields);
            }
            if let Some(extra) = node.extra_schema() {
                self.fields(ANY_KEY_SENTINEL, extra, false, None, &mut form.fields);
            }
            return;
        }

        let mut scalar = Vec::new();
        self.fields("value", node, false, None, &mut scalar);
        if form.scalar_field.is_none() {
            if let Some(field) = scalar.into_iter().next() {
                form.scalar_field = Some(Box::new(field));
            }
        }
    }

    /// Append the field(s) `node` describes under `name`. Unions and
    /// multi-type nodes yield one field per member.
    fn fields(
        &mut self,
        name: &str,
        node: &SchemaNode,
        required: bool,
        form_id: Option<&str>,
        out: &mut Vec<Field>,
    ) {
        let start = out.len();

        if let Some(reference) = &node.reference {
            let target = ref_target(reference);
            match self.enter(target) {
                Some(resolved) => {
                    self.fields(name, resolved, required, Some(target), out);
                    self.stack.pop();
                }
                None => out.push(Field::new(name, DataType::Object).with_sub_form_id(target)),
            }
        } else if !node.union().is_empty() {
            for member in node.union() {
                self.fields(name, member, required, None, out);
            }
        } else {
            let types = node.types();
            if types.is_empty() {
                if let Some(field) = self.typed_field(name, node, inferred_type(node), form_id) {
                    out.push(field);
                }
            } else {
                for type_name in types {
                    if let Some(field) = self.typed_field(name, node, Some(type_name), form_id) {
                        out.push(field);
                    }
                }
            }
        }

        let derivable = node.reference.is_none() && node.union().is_empty() && node.types() != ["null"];
        if out.len() == start && derivable {
            self.advisories.push(Advisory::record(
                AdvisoryKind::UnrecognizedType,
                name,
                "no data type could be derived; field left undefined",
            ));
        }

        for field in &mut out[start..] {
            if required {
                field.is_required = true;
            }
            if node.title.is_some() {
                field.title = node.title.clone();
            }
            if node.description.is_some() {
                field.description = node.description.clone();
            }
            if node.default.is_some() {
                field.default_value = node.default.clone();
            }
            field.is_deprecated |= node.deprecated;
        }
    }

    fn typed_field(
        &mut self,
        name: &str,
        node: &SchemaNode,
        type_name: Option<&str>,
        form_id: Option<&str>,
    ) -> Option<Field> {
        let choices: Vec<Choice> = node.enum_values.iter().cloned().map(Choice::new).collect();
        let field = match type_name? {
            "object" => {
                let mut sub = match form_id {
                    Some(id) => Form::new(id),
                    None => Form::anonymous(),
                };
                self.form_body(node, &mut sub);
                if sub.fields.is_empty() && sub.scalar_field.is_none() {
                    Field::new(name, DataType::Object)
                } else {
                    Field::new(name, DataType::Object).with_sub_form(sub)
                }
            }
            "array" => {
                let items = node.items.as_deref()?;
                let mut element = Form::anonymous();
                self.fields(ANY_KEY_SENTINEL, items, false, None, &mut element.fields);
                if element.fields.is_empty() {
                    return None;
                }
                Field::new(name, DataType::ObjectArray)
                    .with_sub_form(element)
                    .with_length(node.min_items, node.max_items)
            }
            "string" => {
                let data_type = match node.format.as_deref() {
                    Some("uuid") => DataType::Uuid,
                    _ if !choices.is_empty() => DataType::StringEnum,
                    _ => DataType::String,
                };
                let mut field = Field::new(name, data_type)
                    .with_length(node.min_length, node.max_length)
                    .with_choices(choices);
                field.valid_pattern = node.pattern.clone();
                field
            }
            "integer" => {
                let data_type = if choices.is_empty() {
                    DataType::Int
                } else {
                    DataType::IntEnum
                };
                Field::new(name, data_type)
                    .with_range(node.minimum, node.maximum)
                    .with_choices(choices)
            }
            "number" => Field::new(name, DataType::Number).with_range(node.minimum, node.maximum),
            "boolean" => Field::new(name, DataType::Boolean),
            _ => return None,
        };
        Some(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(value: Value) -> SchemaCatalog {
        SchemaCatalog::from_value(value).unwrap()
    }

    #[test]
    fn object_properties_become_fields() {
        let catalog = catalog(json!({
            "definitions": {
                "minecraft:light_block": {
                    "title": "Light Block",
                    "type": "object",
                    "required": ["luminance"],
                    "properties": {
                        "luminance": {"type": "integer", "minimum": 0, "maximum": 15, "default": 0},
                        "mode": {"type": "string", "enum": ["on", "off"]},
                        "id": {"type": "string", "format": "uuid"}
                    }
                }
            }
        }));
        let mut importer = CatalogImporter::new(&catalog);
        let form = importer.import("minecraft:light_block").unwrap();
        assert_eq!(form.title.as_deref(), Some("Light Block"));

        let luminance = form.field("luminance").unwrap();
        assert_eq!(luminance.data_type, DataType::Int);
        assert!(luminance.is_required);
        assert_eq!(luminance.max_value, Some(15.0));
        assert_eq!(luminance.default_value, Some(json!(0)));
        assert_eq!(form.field("mode").unwrap().data_type, DataType::StringEnum);
        assert_eq!(form.field("mode").unwrap().choices.len(), 2);
        assert_eq!(form.field("id").unwrap().data_type, DataType::Uuid);
        assert!(importer.advisories().is_empty());
    }

    #[test]
    fn unions_become_same_id_fragments() {
        let catalog = catalog(json!({
            "definitions": {
                "x": {
                    "type": "object",
                    "properties": {
                        "size": {"anyOf": [{"type": "integer"}, {"type": "array", "items": {"type": "integer"}}]},
                        "name": {"type": ["string", "null"]}
                    }
                }
            }
        }));
        let form = CatalogImporter::new(&catalog).import("x").unwrap();
        let sizes: Vec<_> = form.fields.iter().filter(|f| f.id == "size").collect();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].data_type, DataType::Int);
        assert_eq!(sizes[1].data_type, DataType::ObjectArray);
        assert_eq!(form.fields.iter().filter(|f| f.id == "name").count(), 1);
    }

    #[test]
    fn additional_properties_become_sentinels() {
        let catalog = catalog(json!({
            "definitions": {
                "x": {
                    "type": "object",
                    "properties": {
                        "tags": {"type": "object", "additionalProperties": {"type": "string"}}
                    }
                }
            }
        }));
        let form = CatalogImporter::new(&catalog).import("x").unwrap();
        let tags = form.field("tags").unwrap();
        let sub = tags.sub_form.as_ref().unwrap();
        assert_eq!(sub.fields[0].id, ANY_KEY_SENTINEL);
        assert_eq!(sub.fields[0].data_type, DataType::String);

        let (normalized, _) = formdef_merge::normalize(form);
        assert_eq!(normalized.field("tags").unwrap().data_type, DataType::KeyedStringCollection);
    }

    #[test]
    fn references_expand_inline() {
        let catalog = catalog(json!({
            "definitions": {
                "filter": {"type": "object", "properties": {"test": {"type": "string"}}},
                "x": {"type": "object", "properties": {"when": {"$ref": "#/definitions/filter"}}}
            }
        }));
        let form = CatalogImporter::new(&catalog).import("x").unwrap();
        let when = form.field("when").unwrap();
        let sub = when.sub_form.as_ref().unwrap();
        assert_eq!(sub.id.as_deref(), Some("filter"));
        assert!(sub.field("test").is_some());
    }

    #[test]
    fn a_b_a_cycle_reports_exactly_one_advisory() {
        let catalog = catalog(json!({
            "definitions": {
                "a": {"type": "object", "properties": {"b": {"$ref": "#/definitions/b"}}},
                "b": {"type": "object", "properties": {"a": {"$ref": "#/definitions/a"}}}
            }
        }));
        let mut importer = CatalogImporter::new(&catalog);
        let form = importer.import("a").unwrap();

        let cycles: Vec<_> = importer
            .advisories()
            .iter()
            .filter(|a| a.kind == AdvisoryKind::DependencyCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].subject, "a");

        let b = form.field("b").unwrap().sub_form.as_ref().unwrap();
        let back = b.field("a").unwrap();
        assert_eq!(back.sub_form_id.as_deref(), Some("a"));
        assert!(back.sub_form.is_none());
    }

    #[test]
    fn a_cycle_entered_from_each_node_is_reported_once() {
        let catalog = catalog(json!({
            "definitions": {
                "a": {"type": "object", "properties": {"b": {"$ref": "#/definitions/b"}}},
                "b": {"type": "object", "properties": {"a": {"$ref": "#/definitions/a"}}},
                "c": {"type": "object", "properties": {"c": {"$ref": "#/definitions/c"}}}
            }
        }));
        let mut importer = CatalogImporter::new(&catalog);
        let forms = importer.import_all();
        assert_eq!(forms.len(), 3);

        let subjects: Vec<_> = importer
            .advisories()
            .iter()
            .filter(|a| a.kind == AdvisoryKind::DependencyCycle)
            .map(|a| a.subject.as_str())
            .collect();
        assert_eq!(subjects, vec!["a", "c"]);

        let from_b = forms[1].field("a").unwrap().sub_form.as_ref().unwrap();
        assert_eq!(from_b.field("b").unwrap().sub_form_id.as_deref(), Some("b"));
    }

    #[test]
    fn dangling_reference_and_unknown_type_are_advisories() {
        let catalog = catalog(json!({
            "definitions": {
                "x": {
                    "type": "object",
                    "properties": {
                        "missing": {"$ref": "#/definitions/nowhere"},
                        "odd": {"type": "quaternion"}
                    }
                }
            }
        }));
        let mut importer = CatalogImporter::new(&catalog);
        let form = importer.import("x").unwrap();
        let kinds: Vec<_> = importer.advisories().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AdvisoryKind::UnresolvedReference, AdvisoryKind::UnrecognizedType]);
        assert_eq!(form.field("missing").unwrap().sub_form_id.as_deref(), Some("nowhere"));
        assert!(form.field("odd").is_none());
    }

    #[test]
    fn scalar_nodes_become_scalar_fields_and_nested_definitions_hoist() {
        let catalog = catalog(json!({
            "definitions": {
                "health": {
                    "anyOf": [
                        {"type": "integer"},
                        {"type": "object", "properties": {"value": {"type": "integer"}}}
                    ],
                    "definitions": {"inner": {"type": "string"}}
                }
            }
        }));
        assert!(catalog.get("inner").is_some());
        let form = CatalogImporter::new(&catalog).import("health").unwrap();
        assert_eq!(form.scalar_field.as_ref().unwrap().data_type, DataType::Int);
        assert!(form.field("value").is_some());
    }
}
