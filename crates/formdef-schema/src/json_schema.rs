//! # JSON Schema Export
//!
//! Renders a [`Form`] as a draft 2020-12 JSON Schema document. Each form
//! identity becomes one entry under `$defs` and every use of it is a
//! `$ref`, so cyclic form graphs export as finite, recursive documents.
//!
//! A form with a scalar authority gets a second definition,
//! `<name>_or_scalar`, used wherever a bare scalar is acceptable (the root
//! and `object` fields). Object array elements and keyed collection values
//! reference the plain object definition.
//!
//! [`build_validator`] hands the export to the `jsonschema` crate, which
//! gives an independent cross-check of the hand-built compiler.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use formdef_core::{DataType, Field, Form, FormRegistry};
use serde_json::{json, Map, Value};

use crate::error::CompileError;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";
const VERSION_PATTERN: &str = r"^[0-9]+(\.[0-9]+)*$";

/// Export `form` and everything it references.
pub fn to_json_schema(form: &Arc<Form>, registry: &dyn FormRegistry) -> Value {
    let mut exporter = Exporter {
        registry,
        defs: Map::new(),
        names: HashMap::new(),
        taken: HashSet::new(),
        pinned: Vec::new(),
    };
    let root = exporter.def_name(form, "root", true);
    tracing::debug!(
        form = %form.display_id(),
        forms = exporter.pinned.len(),
        defs = exporter.defs.len(),
        "exported JSON Schema"
    );

    let mut document = Map::new();
    document.insert("$schema".into(), json!(DRAFT));
    if let Some(id) = &form.id {
        document.insert("$id".into(), json!(format!("urn:formdef:{id}")));
    }
    if let Some(title) = &form.title {
        document.insert("title".into(), json!(title));
    }
    if let Some(description) = &form.description {
        document.insert("description".into(), json!(description));
    }
    document.insert("$ref".into(), reference(&root));
    document.insert("$defs".into(), Value::Object(exporter.defs));
    Value::Object(document)
}

/// Export `form` and build a `jsonschema` validator for it.
pub fn build_validator(
    form: &Arc<Form>,
    registry: &dyn FormRegistry,
) -> Result<jsonschema::Validator, CompileError> {
    let schema = to_json_schema(form, registry);
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft202012);
    opts.build(&schema).map_err(|e| CompileError::JsonSchema {
        form: form.display_id().to_string(),
        reason: e.to_string(),
    })
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{name}") })
}

fn sanitize(raw: &str) -> String {
    let name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "form".to_string()
    } else {
        name
    }
}

struct Exporter<'a> {
    registry: &'a dyn FormRegistry,
    defs: Map<String, Value>,
    names: HashMap<(usize, bool), String>,
    taken: HashSet<String>,
    pinned: Vec<Arc<Form>>,
}

impl Exporter<'_> {
    fn unique(&mut self, base: String) -> String {
        let mut name = base.clone();
        let mut n = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{base}_{n}");
            n += 1;
        }
        name
    }

    /// Name of the definition for `form`, exporting it on first use.
    fn def_name(&mut self, form: &Arc<Form>, hint: &str, scalar: bool) -> String {
        let scalar = scalar && form.scalar_authority().is_some();
        let key = (Arc::as_ptr(form) as usize, scalar);
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }

        if scalar {
            let base = self.def_name(form, hint, false);
            let name = self.unique(format!("{base}_or_scalar"));
            self.names.insert(key, name.clone());
            let scalar_schema = match form.scalar_authority() {
                Some(authority) => self.field_schema(authority, &base),
                None => Value::Bool(false),
            };
            self.defs
                .insert(name.clone(), json!({ "anyOf": [reference(&base), scalar_schema] }));
            return name;
        }

        let name = self.unique(sanitize(form.id.as_deref().unwrap_or(hint)));
        self.names.insert(key, name.clone());
        self.pinned.push(Arc::clone(form));
        self.defs.insert(name.clone(), Value::Null);
        let definition = self.form_schema(form, &name);
        self.defs.insert(name.clone(), definition);
        name
    }

    fn form_schema(&mut self, form: &Form, name: &str) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut either = Vec::new();

        for field in &form.fields {
            let schema = self.field_schema(field, name);
            if let Some(alt) = &field.alt_id {
                properties.insert(alt.clone(), schema.clone());
            }
            properties.insert(field.id.clone(), schema);
            if field.is_required_on_any_variant() {
                match &field.alt_id {
                    Some(alt) => either.push(json!({
                        "anyOf": [{ "required": [field.id] }, { "required": [alt] }]
                    })),
                    None => required.push(json!(field.id)),
                }
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        if let Some(title) = &form.title {
            schema.insert("title".into(), json!(title));
        }
        if let Some(description) = &form.description {
            schema.insert("description".into(), json!(description));
        }
        if form.is_deprecated {
            schema.insert("deprecated".into(), json!(true));
        }
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        if !either.is_empty() {
            schema.insert("allOf".into(), Value::Array(either));
        }
        if let Some(custom) = form.custom_field.as_deref() {
            let catch_all = self.field_schema(custom, name);
            schema.insert("additionalProperties".into(), catch_all);
        }
        Value::Object(schema)
    }

    /// A field with its annotations; alternates become `anyOf`.
    fn field_schema(&mut self, field: &Field, owner: &str) -> Value {
        let mut schema = if field.alternates.is_empty() {
            self.type_schema(field, owner)
        } else {
            let variants: Vec<Value> = field
                .variants()
                .map(|v| self.type_schema(v, owner))
                .collect();
            json!({ "anyOf": variants })
        };

        if let Value::Object(map) = &mut schema {
            if let Some(title) = &field.title {
                map.insert("title".into(), json!(title));
            }
            if let Some(description) = &field.description {
                map.insert("description".into(), json!(description));
            }
            if let Some(default) = &field.default_value {
                map.insert("default".into(), default.clone());
            }
            if field.is_deprecated {
                map.insert("deprecated".into(), json!(true));
            }
        }
        schema
    }

    fn resolve(&self, field: &Field) -> Option<Arc<Form>> {
        if let Some(sub) = &field.sub_form {
            return Some(Arc::clone(sub));
        }
        self.registry.get_form(field.sub_form_id.as_deref()?)
    }

    fn element_shape(&mut self, field: &Field, owner: &str) -> Value {
        match self.resolve(field) {
            Some(sub) => reference(&self.def_name(&sub, &format!("{owner}_{}", field.id), false)),
            None => json!({ "type": "object" }),
        }
    }

    /// The schema of one variant's data type and constraints.
    fn type_schema(&mut self, field: &Field, owner: &str) -> Value {
        use DataType as T;

        let data_type = field.data_type;
        let mut schema = match data_type {
            T::Int | T::IntEnum | T::IntValueLookup | T::Long => json!({ "type": "integer" }),
            T::Float | T::Number => json!({ "type": "number" }),
            T::Boolean => json!({ "type": "boolean" }),
            T::IntBoolean => json!({
                "anyOf": [
                    { "type": "boolean" },
                    { "type": "integer", "minimum": 0, "maximum": 1 }
                ]
            }),
            T::Version => json!({
                "anyOf": [
                    { "type": "string", "pattern": VERSION_PATTERN },
                    {
                        "type": "array",
                        "prefixItems": [
                            { "type": "integer", "minimum": 0 },
                            { "type": "integer", "minimum": 0 },
                            { "type": "integer", "minimum": 0 }
                        ],
                        "minItems": 3,
                        "maxItems": 3
                    }
                ]
            }),
            T::Point2 | T::Point3 | T::IntPoint3 => {
                let axis = if data_type == T::IntPoint3 { "integer" } else { "number" };
                let names: &[&str] = if data_type == T::Point2 { &["x", "y"] } else { &["x", "y", "z"] };
                let properties: Map<String, Value> = names
                    .iter()
                    .map(|n| ((*n).to_string(), json!({ "type": axis })))
                    .collect();
                json!({
                    "anyOf": [
                        {
                            "type": "array",
                            "items": { "type": axis },
                            "minItems": names.len(),
                            "maxItems": names.len()
                        },
                        { "type": "object", "properties": properties, "required": names }
                    ]
                })
            }
            T::IntRange | T::FloatRange | T::PercentRange => {
                let bound = if data_type == T::IntRange { "integer" } else { "number" };
                json!({
                    "anyOf": [
                        { "type": bound },
                        { "type": "array", "items": { "type": bound }, "minItems": 2, "maxItems": 2 },
                        {
                            "type": "object",
                            "properties": { "min": { "type": bound }, "max": { "type": bound } }
                        }
                    ]
                })
            }
            T::Object => match self.resolve(field) {
                Some(sub) => {
                    let hint = format!("{owner}_{}", field.id);
                    reference(&self.def_name(&sub, &hint, true))
                }
                None => match field.custom_field.as_deref() {
                    Some(custom) => {
                        let values = self.field_schema(custom, owner);
                        json!({ "type": "object", "additionalProperties": values })
                    }
                    None => json!({ "type": "object" }),
                },
            },
            T::KeyedObjectCollection => {
                let values = self.element_shape(field, owner);
                json!({ "type": "object", "additionalProperties": values })
            }
            T::ObjectArray => {
                let items = self.element_shape(field, owner);
                json!({ "type": "array", "items": items })
            }
            T::FilterExpression => json!({
                "anyOf": [
                    { "type": "object" },
                    { "type": "array", "items": { "type": "object" } }
                ]
            }),
            T::EventTrigger => json!({ "type": ["object", "string"] }),
            T::MolangExpression => json!({ "type": ["string", "number"] }),
            T::Uuid => json!({ "type": "string", "format": "uuid" }),
            t if t.is_string() => json!({ "type": "string" }),
            t if t.is_keyed_collection() || t.is_array() => match t.element_type() {
                Some(element) => {
                    let inner = self.type_schema(&Field::new("", element), owner);
                    if t.is_array() {
                        json!({ "type": "array", "items": inner })
                    } else {
                        json!({ "type": "object", "additionalProperties": inner })
                    }
                }
                None => json!({}),
            },
            _ => json!({}),
        };

        if let Value::Object(map) = &mut schema {
            constrain(map, field);
        }
        schema
    }
}

fn constrain(map: &mut Map<String, Value>, field: &Field) {
    let data_type = field.data_type;
    if data_type.is_numeric() {
        if let Some(min) = field.min_value {
            map.insert("minimum".into(), json!(min));
        }
        if let Some(max) = field.max_value {
            map.insert("maximum".into(), json!(max));
        }
    }
    if data_type.is_string() {
        if let Some(min) = field.min_length {
            map.insert("minLength".into(), json!(min));
        }
        if let Some(max) = field.max_length {
            map.insert("maxLength".into(), json!(max));
        }
        if let Some(pattern) = &field.valid_pattern {
            map.insert("pattern".into(), json!(pattern));
        }
    }
    if data_type.is_array() {
        if let Some(min) = field.min_length {
            map.insert("minItems".into(), json!(min));
        }
        if let Some(max) = field.max_length {
            map.insert("maxItems".into(), json!(max));
        }
    }
    if data_type.is_enum() && !field.choices.is_empty() {
        let values: Vec<Value> = field.choices.iter().map(|c| c.id.clone()).collect();
        map.insert("enum".into(), Value::Array(values));
    }
}
