//! # Compiled Schema
//!
//! A form compiled into an arena of [`Node`]s. Nodes reference each other
//! by [`NodeId`], so a form reached again through a cycle of `sub_form_id`
//! references is simply an edge back to an existing node. Checking walks
//! the data, never the graph, which is why a cyclic schema still accepts
//! finite documents of any depth.

use std::fmt;

use formdef_core::{is_version_string, Choice};
use regex::Regex;
use serde_json::{Map, Value};

/// Index of a node in a [`CompiledSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Extra validation applied to string nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrFormat {
    Plain,
    Uuid,
    /// Dotted decimal version such as `1.20.0`.
    Version,
}

/// A declared key of an object node.
#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    /// Legacy key accepted when `key` is absent.
    pub alt_key: Option<String>,
    pub node: NodeId,
    pub required: bool,
}

/// One compiled schema node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Reserved for a form whose fields are still being compiled.
    Pending,
    Any,
    Bool,
    Integer {
        min: Option<f64>,
        max: Option<f64>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Str {
        format: StrFormat,
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<Regex>,
    },
    /// A closed literal union over a base type.
    OneOf {
        base: NodeId,
        choices: Vec<Choice>,
    },
    /// Fixed-length array with one node per position.
    Tuple(Vec<NodeId>),
    /// Object with declared properties. Undeclared keys are checked
    /// against `catch_all` when present and accepted otherwise. A
    /// non-object value is checked against `scalar` when present.
    Object {
        properties: Vec<Property>,
        catch_all: Option<NodeId>,
        scalar: Option<NodeId>,
    },
    Array {
        items: NodeId,
        min_len: Option<usize>,
        max_len: Option<usize>,
    },
    /// String-keyed map with uniform values.
    Map {
        values: NodeId,
    },
    /// Accepts a value accepted by any member.
    Union(Vec<NodeId>),
}

/// A problem reported by [`CompiledSchema::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// `/`-separated path; empty for the root.
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// A reusable runtime validator compiled from a form.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) form_id: String,
}

impl CompiledSchema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id of the form this schema was compiled from.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Check `value`, returning every problem found.
    pub fn check(&self, value: &Value) -> Result<(), Vec<SchemaIssue>> {
        let mut issues = Vec::new();
        self.check_node(self.root, value, "", &mut issues);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    fn check_node(&self, id: NodeId, value: &Value, path: &str, issues: &mut Vec<SchemaIssue>) {
        match self.node(id) {
            Node::Pending | Node::Any => {}
            Node::Bool => {
                if !value.is_boolean() {
                    issues.push(issue(path, format!("expected a boolean, found {}", kind(value))));
                }
            }
            Node::Integer { min, max } => {
                if !(value.is_i64() || value.is_u64()) {
                    issues.push(issue(path, format!("expected an integer, found {}", kind(value))));
                } else {
                    bounds(value, *min, *max, path, issues);
                }
            }
            Node::Number { min, max } => {
                if !value.is_number() {
                    issues.push(issue(path, format!("expected a number, found {}", kind(value))));
                } else {
                    bounds(value, *min, *max, path, issues);
                }
            }
            Node::Str {
                format,
                min_len,
                max_len,
                pattern,
            } => {
                let Some(s) = value.as_str() else {
                    issues.push(issue(path, format!("expected a string, found {}", kind(value))));
                    return;
                };
                let well_formed = match format {
                    StrFormat::Plain => true,
                    StrFormat::Uuid => uuid::Uuid::parse_str(s).is_ok(),
                    StrFormat::Version => is_version_string(s),
                };
                if !well_formed {
                    issues.push(issue(path, format!("'{s}' is not a valid {format:?} string")));
                    return;
                }
                lengths(s.chars().count(), *min_len, *max_len, path, issues);
                if let Some(re) = pattern {
                    if !re.is_match(s) {
                        issues.push(issue(path, format!("'{s}' does not match the pattern '{}'", re.as_str())));
                    }
                }
            }
            Node::OneOf { base, choices } => {
                let before = issues.len();
                self.check_node(*base, value, path, issues);
                if issues.len() == before && !choices.iter().any(|c| c.matches(value)) {
                    issues.push(SchemaIssue {
                        path: path.to_string(),
                        message: format!("{value} is not one of the {} declared choices", choices.len()),
                    });
                }
            }
            Node::Tuple(items) => match value {
                Value::Array(values) if values.len() == items.len() => {
                    for (i, (node, v)) in items.iter().zip(values).enumerate() {
                        self.check_node(*node, v, &format!("{path}/{i}"), issues);
                    }
                }
                _ => issues.push(issue(path, format!("expected an array of {} elements, found {}", items.len(), kind(value)))),
            },
            Node::Object {
                properties,
                catch_all,
                scalar,
            } => match (value, scalar) {
                (Value::Object(map), _) => self.check_object(map, properties, *catch_all, path, issues),
                (_, Some(scalar)) => self.check_node(*scalar, value, path, issues),
                (_, None) => issues.push(issue(path, format!("expected an object, found {}", kind(value)))),
            },
            Node::Array {
                items,
                min_len,
                max_len,
            } => match value {
                Value::Array(values) => {
                    lengths(values.len(), *min_len, *max_len, path, issues);
                    for (i, v) in values.iter().enumerate() {
                        self.check_node(*items, v, &format!("{path}/{i}"), issues);
                    }
                }
                _ => issues.push(issue(path, format!("expected an array, found {}", kind(value)))),
            },
            Node::Map { values } => match value {
                Value::Object(map) => {
                    for (key, v) in map {
                        self.check_node(*values, v, &format!("{path}/{key}"), issues);
                    }
                }
                _ => issues.push(issue(path, format!("expected an object, found {}", kind(value)))),
            },
            Node::Union(members) => {
                let mut first: Option<Vec<SchemaIssue>> = None;
                for member in members {
                    let mut scratch = Vec::new();
                    self.check_node(*member, value, path, &mut scratch);
                    if scratch.is_empty() {
                        return;
                    }
                    first.get_or_insert(scratch);
                }
                match first {
                    Some(found) if members.len() == 1 => issues.extend(found),
                    _ => issues.push(SchemaIssue {
                        path: path.to_string(),
                        message: format!(
                            "{} matches none of {} expected types",
                            kind(value),
                            members.len()
                        ),
                    }),
                }
            }
        }
    }

    fn check_object(
        &self,
        map: &Map<String, Value>,
        properties: &[Property],
        catch_all: Option<NodeId>,
        path: &str,
        issues: &mut Vec<SchemaIssue>,
    ) {
        for property in properties {
            let present = map
                .get(&property.key)
                .map(|v| (property.key.as_str(), v))
                .or_else(|| {
                    let alt = property.alt_key.as_deref()?;
                    map.get(alt).map(|v| (alt, v))
                });
            match present {
                Some((key, v)) => self.check_node(property.node, v, &format!("{path}/{key}"), issues),
                None if property.required => issues.push(SchemaIssue {
                    path: format!("{path}/{}", property.key),
                    message: format!("missing required field '{}'", property.key),
                }),
                None => {}
            }
        }

        let Some(catch_all) = catch_all else {
            return;
        };
        for (key, v) in map {
            let declared = properties
                .iter()
                .any(|p| p.key == *key || p.alt_key.as_deref() == Some(key.as_str()));
            if !declared {
                self.check_node(catch_all, v, &format!("{path}/{key}"), issues);
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn issue(path: &str, message: String) -> SchemaIssue {
    SchemaIssue {
        path: path.to_string(),
        message,
    }
}

fn bounds(value: &Value, min: Option<f64>, max: Option<f64>, path: &str, issues: &mut Vec<SchemaIssue>) {
    let Some(n) = value.as_f64() else {
        return;
    };
    if let Some(min) = min.filter(|min| n < *min) {
        issues.push(issue(path, format!("value {value} is below the minimum {min}")));
    }
    if let Some(max) = max.filter(|max| n > *max) {
        issues.push(issue(path, format!("value {value} is above the maximum {max}")));
    }
}

fn lengths(len: usize, min: Option<usize>, max: Option<usize>, path: &str, issues: &mut Vec<SchemaIssue>) {
    if let Some(min) = min.filter(|min| len < *min) {
        issues.push(issue(path, format!("length {len} is shorter than the minimum {min}")));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        issues.push(issue(path, format!("length {len} is longer than the maximum {max}")));
    }
}
