//! # Legacy Documentation Importer
//!
//! Reads the line-oriented prose documentation format:
//!
//! ```text
//! ## minecraft:light_block
//! Makes the block emit light.
//!
//! | Name | Default Value | Type | Description |
//! |:-----|:--------------|:-----|:------------|
//! | luminance | 0 | Integer | Light level, 0 to 15. |
//! | on_use | *not set* | JSON Object | Event fired when used. |
//!
//! ### on_use
//! | Name | Default Value | Type | Description |
//! | event | *not set* | String | Event name. |
//! ```
//!
//! A `##` heading starts a form. A deeper heading describes the sub-form
//! of the same-named row in the nearest shallower section. Sections nested
//! deeper than [`LegacyImportOptions::max_depth`] are skipped with a
//! [`AdvisoryKind::DepthLimit`] advisory.

use formdef_core::{Advisory, AdvisoryKind, DataType, Field, Form};
use serde_json::Value;

/// Knobs for [`parse_legacy_docs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyImportOptions {
    /// Deepest sub-section nesting converted into sub-forms.
    pub max_depth: usize,
}

impl Default for LegacyImportOptions {
    fn default() -> Self {
        Self { max_depth: 8 }
    }
}

#[derive(Debug, Default)]
struct Row {
    name: String,
    default: String,
    type_name: String,
    description: String,
}

#[derive(Debug, Default)]
struct Section {
    level: usize,
    title: String,
    prose: Vec<String>,
    rows: Vec<Row>,
    children: Vec<Section>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    default: Option<usize>,
    type_name: usize,
    description: Option<usize>,
}

/// Parse legacy documentation into one form per `##` section.
pub fn parse_legacy_docs(text: &str, options: &LegacyImportOptions) -> (Vec<Form>, Vec<Advisory>) {
    let sections = sections(text);
    let mut advisories = Vec::new();
    let forms: Vec<Form> = sections
        .iter()
        .map(|section| {
            let mut form = Form::new(clean(&section.title));
            if !section.prose.is_empty() {
                form.description = Some(section.prose.join(" "));
            }
            fill(&mut form, section, 0, options, &mut advisories);
            form
        })
        .collect();
    tracing::debug!(forms = forms.len(), advisories = advisories.len(), "parsed legacy documentation");
    (forms, advisories)
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    let rest = &line[level..];
    (level >= 2 && rest.starts_with(' ')).then(|| (level, rest.trim()))
}

fn cells(line: &str) -> Vec<String> {
    let inner = line.trim().trim_start_matches('|').trim_end_matches('|');
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator(line: &str) -> bool {
    cells(line)
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

fn columns(header: &[String]) -> Option<Columns> {
    let find = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    Some(Columns {
        name: find(&["name"])?,
        default: find(&["default value", "default"]),
        type_name: find(&["type"])?,
        description: find(&["description"]),
    })
}

/// Split the text into a tree of sections by heading level.
fn sections(text: &str) -> Vec<Section> {
    let mut roots: Vec<Section> = Vec::new();
    let mut open: Vec<Section> = Vec::new();
    let mut table: Option<Columns> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if let Some((level, title)) = heading(line) {
            while open.last().is_some_and(|s| s.level >= level) {
                close(&mut open, &mut roots);
            }
            open.push(Section {
                level,
                title: title.to_string(),
                ..Section::default()
            });
            table = None;
            continue;
        }
        let Some(section) = open.last_mut() else {
            continue;
        };
        if line.starts_with('|') {
            if is_separator(line) {
                continue;
            }
            let row = cells(line);
            match table {
                None => table = columns(&row),
                Some(cols) => {
                    let get = |i: Option<usize>| i.and_then(|i| row.get(i)).cloned().unwrap_or_default();
                    section.rows.push(Row {
                        name: get(Some(cols.name)),
                        default: get(cols.default),
                        type_name: get(Some(cols.type_name)),
                        description: get(cols.description),
                    });
                }
            }
        } else {
            table = None;
            if !line.is_empty() && section.rows.is_empty() {
                section.prose.push(line.to_string());
            }
        }
    }
    while !open.is_empty() {
        close(&mut open, &mut roots);
    }
    roots
}

fn close(open: &mut Vec<Section>, roots: &mut Vec<Section>) {
    if let Some(section) = open.pop() {
        match open.last_mut() {
            Some(parent) => parent.children.push(section),
            None => roots.push(section),
        }
    }
}

/// Strip markdown decoration from a name or title.
fn clean(text: &str) -> String {
    text.trim().trim_matches('`').trim_matches('*').trim().to_string()
}

fn fill(
    form: &mut Form,
    section: &Section,
    depth: usize,
    options: &LegacyImportOptions,
    advisories: &mut Vec<Advisory>,
) {
    for row in &section.rows {
        let name = clean(&row.name);
        if name.is_empty() {
            continue;
        }
        let data_type = match data_type(&row.type_name) {
            Some(t) => t,
            None => {
                advisories.push(Advisory::record(
                    AdvisoryKind::UnrecognizedType,
                    format!("{}/{name}", form.display_id()),
                    format!("unrecognized type '{}'; treated as string", row.type_name),
                ));
                DataType::String
            }
        };
        let mut field = Field::new(name, data_type);
        if !row.description.is_empty() {
            field.description = Some(row.description.clone());
        }
        field.default_value = default_value(&row.default);
        form.fields.push(field);
    }

    for child in &section.children {
        let title = clean(&child.title);
        if depth + 1 > options.max_depth {
            advisories.push(Advisory::record(
                AdvisoryKind::DepthLimit,
                title,
                format!("section nested deeper than {} levels skipped", options.max_depth),
            ));
            continue;
        }
        let mut sub = Form::anonymous();
        fill(&mut sub, child, depth + 1, options, advisories);

        let Some(field) = form.fields.iter_mut().find(|f| f.id.eq_ignore_ascii_case(&title)) else {
            advisories.push(Advisory::record(
                AdvisoryKind::UnresolvedReference,
                title,
                format!("sub-section matches no field of '{}'", form.display_id()),
            ));
            continue;
        };
        if !field.data_type.takes_sub_form() {
            field.data_type = if field.data_type.is_array() {
                DataType::ObjectArray
            } else {
                DataType::Object
            };
        }
        field.sub_form = Some(sub.into_shared());
    }
}

/// Map a documented type name to a data type.
fn data_type(type_name: &str) -> Option<DataType> {
    let name = clean(type_name).to_ascii_lowercase();
    let base = name.split(['[', '(']).next().unwrap_or(&name).trim();
    let t = match base {
        "integer" | "int" => DataType::Int,
        "long" => DataType::Long,
        "decimal" | "float" => DataType::Float,
        "number" => DataType::Number,
        "boolean" | "bool" => DataType::Boolean,
        "string" => DataType::String,
        "localization string" | "localized string" => DataType::LocalizableString,
        "molang" | "molang expression" => DataType::MolangExpression,
        "trigger" | "event trigger" => DataType::EventTrigger,
        "minecraft filter" | "filter" => DataType::FilterExpression,
        "range" => DataType::FloatRange,
        "integer range" => DataType::IntRange,
        "vector" | "vector3" | "position" => DataType::Point3,
        "vector2" => DataType::Point2,
        "json object" | "object" => DataType::Object,
        "array" | "list" => DataType::ObjectArray,
        "string array" | "array of strings" => DataType::StringArray,
        "version" => DataType::Version,
        "uuid" => DataType::Uuid,
        _ => return None,
    };
    Some(t)
}

/// Parse a documented default: JSON when it parses, nothing for the
/// "not set" placeholders, otherwise the literal text.
fn default_value(text: &str) -> Option<Value> {
    let text = clean(text);
    match text.to_ascii_lowercase().as_str() {
        "" | "not set" | "n/a" | "none" | "-" => None,
        _ => Some(serde_json::from_str(&text).unwrap_or(Value::String(text))),
    }
}
