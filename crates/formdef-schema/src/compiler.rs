//! # Schema Compiler
//!
//! Turns a [`Form`] into a [`CompiledSchema`], independently of the
//! validator crate, and caches the result per form identity.
//!
//! ## Cycle handling
//!
//! Named forms may reference each other in cycles through `sub_form_id`.
//! Compilation is two-phase per form: a [`Node::Pending`] placeholder is
//! reserved and recorded under the form's identity *before* its fields are
//! compiled, so a nested reference back to the same form resolves to the
//! placeholder instead of recursing. The placeholder is overwritten with
//! the finished object node afterwards.
//!
//! Forms fetched from the registry during one build are pinned until the
//! build ends, so no address is reused while it serves as an identity key.
//!
//! ## Cache
//!
//! [`SchemaCompiler`] maps form identity (the `Arc` address) to the
//! compiled schema. Entries hold a `Weak<Form>` and never keep a form
//! alive; two structurally identical forms compile independently.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use formdef_core::{DataType, Field, Form, FormRegistry};
use parking_lot::RwLock;
use regex::Regex;

use crate::compiled::{CompiledSchema, Node, NodeId, Property, StrFormat};
use crate::error::CompileError;

/// Compiler switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Compile min/max, length, pattern and choice constraints.
    pub enforce_constraints: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            enforce_constraints: true,
        }
    }
}

fn identity(form: &Arc<Form>) -> usize {
    Arc::as_ptr(form) as usize
}

/// Compile `form` without caching.
pub fn compile_form(
    form: &Arc<Form>,
    registry: &dyn FormRegistry,
    options: &CompileOptions,
) -> Result<CompiledSchema, CompileError> {
    let mut builder = Builder {
        registry,
        options,
        nodes: Vec::new(),
        forms: HashMap::new(),
        pinned: Vec::new(),
        patterns: HashMap::new(),
    };
    let root = builder.form_node(form, true)?;
    tracing::debug!(
        form = %form.display_id(),
        nodes = builder.nodes.len(),
        forms = builder.pinned.len(),
        "compiled form schema"
    );
    Ok(CompiledSchema {
        nodes: builder.nodes,
        root,
        form_id: form.display_id().to_string(),
    })
}

struct Builder<'a> {
    registry: &'a dyn FormRegistry,
    options: &'a CompileOptions,
    nodes: Vec<Node>,
    /// (form identity, scalar shorthand allowed) → object node.
    forms: HashMap<(usize, bool), NodeId>,
    pinned: Vec<Arc<Form>>,
    patterns: HashMap<String, Regex>,
}

impl Builder<'_> {
    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// The object node for `form`. With `scalar`, a form that has a
    /// scalar authority also accepts that bare scalar.
    fn form_node(&mut self, form: &Arc<Form>, scalar: bool) -> Result<NodeId, CompileError> {
        let scalar = scalar && form.scalar_authority().is_some();
        let key = (identity(form), scalar);
        if let Some(&id) = self.forms.get(&key) {
            return Ok(id);
        }

        let id = self.push(Node::Pending);
        self.forms.insert(key, id);
        self.pinned.push(Arc::clone(form));

        let owner = form.display_id();
        let mut properties = Vec::with_capacity(form.fields.len());
        for field in &form.fields {
            properties.push(Property {
                key: field.id.clone(),
                alt_key: field.alt_id.clone(),
                node: self.field(field, owner)?,
                required: field.is_required_on_any_variant(),
            });
        }
        let catch_all = match form.custom_field.as_deref() {
            Some(custom) => Some(self.field(custom, owner)?),
            None => None,
        };
        let scalar = match form.scalar_authority().filter(|_| scalar) {
            Some(authority) => Some(self.field(authority, owner)?),
            None => None,
        };

        self.nodes[id.0] = Node::Object {
            properties,
            catch_all,
            scalar,
        };
        Ok(id)
    }

    /// A field: its single variant, or the union of all variants.
    fn field(&mut self, field: &Field, owner: &str) -> Result<NodeId, CompileError> {
        if field.alternates.is_empty() {
            return self.compile_field_type(field, owner);
        }
        let mut members = Vec::with_capacity(field.variant_count());
        for variant in field.variants() {
            members.push(self.compile_field_type(variant, owner)?);
        }
        Ok(self.push(Node::Union(members)))
    }

    fn resolve(&self, field: &Field) -> Option<Arc<Form>> {
        if let Some(sub) = &field.sub_form {
            return Some(Arc::clone(sub));
        }
        let id = field.sub_form_id.as_deref()?;
        let found = self.registry.get_form(id);
        if found.is_none() {
            tracing::debug!(field = %field.id, sub_form = %id, "unresolved sub-form; compiling as open object");
        }
        found
    }

    fn open_object(&mut self, catch_all: Option<NodeId>) -> NodeId {
        self.push(Node::Object {
            properties: Vec::new(),
            catch_all,
            scalar: None,
        })
    }

    /// Element shape of an object array or keyed object collection.
    fn element_shape(&mut self, field: &Field) -> Result<NodeId, CompileError> {
        match self.resolve(field) {
            Some(sub) => self.form_node(&sub, false),
            None => Ok(self.open_object(None)),
        }
    }

    /// A bare element type: no constraints, no sub-form.
    fn element(&mut self, data_type: DataType, owner: &str) -> Result<NodeId, CompileError> {
        self.compile_field_type(&Field::new("", data_type), owner)
    }

    fn pattern(&mut self, field: &Field, owner: &str) -> Result<Option<Regex>, CompileError> {
        let Some(pattern) = field.valid_pattern.as_deref().filter(|_| self.options.enforce_constraints) else {
            return Ok(None);
        };
        if let Some(re) = self.patterns.get(pattern) {
            return Ok(Some(re.clone()));
        }
        let re = Regex::new(pattern).map_err(|source| CompileError::InvalidPattern {
            form: owner.to_string(),
            field: field.id.clone(),
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.insert(pattern.to_string(), re.clone());
        Ok(Some(re))
    }

    /// Map one variant's data type (and constraints) to a node.
    fn compile_field_type(&mut self, field: &Field, owner: &str) -> Result<NodeId, CompileError> {
        use DataType as T;

        let enforce = self.options.enforce_constraints;
        let (min, max) = if enforce {
            (field.min_value, field.max_value)
        } else {
            (None, None)
        };
        let (min_len, max_len) = if enforce {
            (field.min_length, field.max_length)
        } else {
            (None, None)
        };

        let data_type = field.data_type;
        let node = match data_type {
            T::Int | T::IntEnum | T::IntValueLookup | T::Long => Node::Integer { min, max },
            T::Float | T::Number => Node::Number { min, max },
            T::Boolean => Node::Bool,
            T::IntBoolean => {
                let flag = self.push(Node::Bool);
                let bit = self.push(Node::Integer {
                    min: Some(0.0),
                    max: Some(1.0),
                });
                Node::Union(vec![flag, bit])
            }
            T::Version => {
                let text = self.push(Node::Str {
                    format: StrFormat::Version,
                    min_len: None,
                    max_len: None,
                    pattern: None,
                });
                let part = self.push(Node::Integer {
                    min: Some(0.0),
                    max: None,
                });
                let parts = self.push(Node::Tuple(vec![part; 3]));
                Node::Union(vec![text, parts])
            }
            T::Point2 | T::Point3 | T::IntPoint3 => {
                let axis = if data_type == T::IntPoint3 {
                    self.push(Node::Integer { min: None, max: None })
                } else {
                    self.push(Node::Number { min: None, max: None })
                };
                let names: &[&str] = if data_type == T::Point2 {
                    &["x", "y"]
                } else {
                    &["x", "y", "z"]
                };
                let tuple = self.push(Node::Tuple(vec![axis; names.len()]));
                let named = self.push(Node::Object {
                    properties: names
                        .iter()
                        .map(|n| Property {
                            key: (*n).to_string(),
                            alt_key: None,
                            node: axis,
                            required: true,
                        })
                        .collect(),
                    catch_all: None,
                    scalar: None,
                });
                Node::Union(vec![tuple, named])
            }
            T::IntRange | T::FloatRange | T::PercentRange => {
                let bound = if data_type == T::IntRange {
                    self.push(Node::Integer { min: None, max: None })
                } else {
                    self.push(Node::Number { min: None, max: None })
                };
                let pair = self.push(Node::Tuple(vec![bound, bound]));
                let named = self.push(Node::Object {
                    properties: ["min", "max"]
                        .iter()
                        .map(|n| Property {
                            key: (*n).to_string(),
                            alt_key: None,
                            node: bound,
                            required: false,
                        })
                        .collect(),
                    catch_all: None,
                    scalar: None,
                });
                Node::Union(vec![bound, pair, named])
            }
            T::Object => {
                return match self.resolve(field) {
                    Some(sub) => self.form_node(&sub, true),
                    None => {
                        let catch_all = match field.custom_field.as_deref() {
                            Some(custom) => Some(self.field(custom, owner)?),
                            None => None,
                        };
                        Ok(self.open_object(catch_all))
                    }
                };
            }
            T::KeyedObjectCollection => Node::Map {
                values: self.element_shape(field)?,
            },
            T::ObjectArray => Node::Array {
                items: self.element_shape(field)?,
                min_len,
                max_len,
            },
            T::FilterExpression => {
                let single = self.open_object(None);
                let list = self.push(Node::Array {
                    items: single,
                    min_len: None,
                    max_len: None,
                });
                Node::Union(vec![single, list])
            }
            T::EventTrigger => {
                let object = self.open_object(None);
                let name = self.push(plain_str(None, None, None));
                Node::Union(vec![object, name])
            }
            T::MolangExpression => {
                let text = self.push(plain_str(None, None, None));
                let number = self.push(Node::Number { min: None, max: None });
                Node::Union(vec![text, number])
            }
            T::Uuid => Node::Str {
                format: StrFormat::Uuid,
                min_len,
                max_len,
                pattern: self.pattern(field, owner)?,
            },
            t if t.is_string() => plain_str(min_len, max_len, self.pattern(field, owner)?),
            t if t.is_keyed_collection() || t.is_array() => match t.element_type() {
                Some(element) => {
                    let inner = self.element(element, owner)?;
                    if t.is_array() {
                        Node::Array {
                            items: inner,
                            min_len,
                            max_len,
                        }
                    } else {
                        Node::Map { values: inner }
                    }
                }
                None => Node::Any,
            },
            _ => Node::Any,
        };

        let id = self.push(node);
        if enforce && data_type.is_enum() && !field.choices.is_empty() {
            return Ok(self.push(Node::OneOf {
                base: id,
                choices: field.choices.clone(),
            }));
        }
        Ok(id)
    }
}

fn plain_str(min_len: Option<usize>, max_len: Option<usize>, pattern: Option<Regex>) -> Node {
    Node::Str {
        format: StrFormat::Plain,
        min_len,
        max_len,
        pattern,
    }
}

type CacheEntry = (Weak<Form>, Arc<CompiledSchema>);

/// Compiles forms on first use and reuses the result per form identity.
///
/// Safe to share across threads; concurrent first uses of one form may
/// both compile, and the first stored result wins.
pub struct SchemaCompiler {
    registry: Arc<dyn FormRegistry>,
    options: CompileOptions,
    cache: RwLock<HashMap<usize, CacheEntry>>,
}

impl SchemaCompiler {
    pub fn new(registry: Arc<dyn FormRegistry>) -> Self {
        Self::with_options(registry, CompileOptions::default())
    }

    pub fn with_options(registry: Arc<dyn FormRegistry>, options: CompileOptions) -> Self {
        Self {
            registry,
            options,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The compiled schema for `form`, compiling it on first use.
    pub fn compile(&self, form: &Arc<Form>) -> Result<Arc<CompiledSchema>, CompileError> {
        let key = identity(form);
        if let Some(schema) = self.lookup(key, form) {
            return Ok(schema);
        }

        let compiled = Arc::new(compile_form(form, self.registry.as_ref(), &self.options)?);

        let mut cache = self.cache.write();
        if let Some((weak, existing)) = cache.get(&key) {
            if weak.upgrade().is_some_and(|live| Arc::ptr_eq(&live, form)) {
                return Ok(Arc::clone(existing));
            }
        }
        cache.insert(key, (Arc::downgrade(form), Arc::clone(&compiled)));
        Ok(compiled)
    }

    fn lookup(&self, key: usize, form: &Arc<Form>) -> Option<Arc<CompiledSchema>> {
        let cache = self.cache.read();
        let (weak, schema) = cache.get(&key)?;
        let live = weak.upgrade()?;
        Arc::ptr_eq(&live, form).then(|| Arc::clone(schema))
    }

    /// Drop the cached schema of `form`, e.g. after it was replaced.
    pub fn invalidate(&self, form: &Arc<Form>) -> bool {
        self.cache.write().remove(&identity(form)).is_some()
    }

    /// Drop entries whose form no longer exists. Returns how many.
    pub fn purge_dead(&self) -> usize {
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|_, (weak, _)| weak.strong_count() > 0);
        before - cache.len()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl std::fmt::Debug for SchemaCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCompiler")
            .field("options", &self.options)
            .field("cached", &self.cached_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdef_core::{Choice, InMemoryFormRegistry, NoForms};
    use serde_json::json;

    fn compile(form: Form) -> CompiledSchema {
        compile_form(&form.into_shared(), &NoForms, &CompileOptions::default()).unwrap()
    }

    #[test]
    fn light_block_range_policy() {
        let schema = compile(
            Form::new("block_light_block")
                .with_field(
                    Field::new("luminance", DataType::Int)
                        .with_range(Some(0.0), Some(15.0))
                        .with_default(0),
                )
                .with_field(Field::new("is_solid", DataType::Boolean).with_default(true)),
        );
        assert!(schema.is_valid(&json!({"luminance": 15, "is_solid": false})));
        let issues = schema.check(&json!({"luminance": 20})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "/luminance");
    }

    #[test]
    fn int_boolean_and_enums() {
        let schema = compile(
            Form::new("x")
                .with_field(Field::new("flag", DataType::IntBoolean))
                .with_field(
                    Field::new("mode", DataType::StringEnum)
                        .with_choices(vec![Choice::new("on"), Choice::new("off")]),
                ),
        );
        assert!(schema.is_valid(&json!({"flag": 1, "mode": "on"})));
        assert!(schema.is_valid(&json!({"flag": false})));
        assert!(!schema.is_valid(&json!({"flag": 2})));
        assert!(!schema.is_valid(&json!({"mode": "dim"})));
    }

    #[test]
    fn alternates_compile_to_union_and_required_on_any_variant() {
        let schema = compile(Form::new("x").with_field(
            Field::new("f", DataType::String).with_alternate(Field::new("f", DataType::Number).required()),
        ));
        assert!(schema.is_valid(&json!({"f": "a"})));
        assert!(schema.is_valid(&json!({"f": 1})));
        let issues = schema.check(&json!({"f": true})).unwrap_err();
        assert!(issues[0].message.contains("matches none of 2 expected types"));
        assert!(!schema.is_valid(&json!({})));
    }

    #[test]
    fn points_and_ranges() {
        let schema = compile(
            Form::new("x")
                .with_field(Field::new("p", DataType::Point3))
                .with_field(Field::new("r", DataType::FloatRange)),
        );
        assert!(schema.is_valid(&json!({"p": [1, 2, 3], "r": 0.5})));
        assert!(schema.is_valid(&json!({"p": {"x": 1, "y": 2, "z": 3}, "r": [0, 1]})));
        assert!(schema.is_valid(&json!({"r": {"max": 2}})));
        assert!(!schema.is_valid(&json!({"p": [1, 2]})));
        assert!(!schema.is_valid(&json!({"r": "wide"})));
    }

    #[test]
    fn keyed_collections_are_maps_of_elements() {
        let schema = compile(Form::new("x").with_field(Field::new("k", DataType::KeyedNumberCollection)));
        assert!(schema.is_valid(&json!({"k": {"a": 1, "b": 2.5}})));
        assert!(!schema.is_valid(&json!({"k": {"a": "1"}})));
    }

    #[test]
    fn invalid_pattern_fails_compilation() {
        let form = Form::new("x").with_field(Field::new("code", DataType::String).with_pattern("(["));
        let err = compile_form(&form.into_shared(), &NoForms, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPattern { ref field, .. } if field == "code"));

        let relaxed = CompileOptions {
            enforce_constraints: false,
        };
        let form = Form::new("x").with_field(Field::new("code", DataType::String).with_pattern("(["));
        assert!(compile_form(&form.into_shared(), &NoForms, &relaxed).is_ok());
    }

    #[test]
    fn cyclic_forms_terminate_and_accept_deep_documents() {
        let registry = InMemoryFormRegistry::new();
        registry.register(
            Form::new("a")
                .with_field(Field::new("name", DataType::String))
                .with_field(Field::new("b", DataType::Object).with_sub_form_id("b")),
        );
        registry.register(
            Form::new("b")
                .with_field(Field::new("count", DataType::Int))
                .with_field(Field::new("a", DataType::Object).with_sub_form_id("a")),
        );
        let a = registry.get_form("a").unwrap();
        let schema = compile_form(&a, &registry, &CompileOptions::default()).unwrap();

        let mut doc = json!({"name": "leaf"});
        for depth in 0..50 {
            doc = if depth % 2 == 0 {
                json!({"count": depth, "a": doc})
            } else {
                json!({"name": "n", "b": doc})
            };
        }
        let root = json!({"name": "root", "b": doc});
        assert!(schema.is_valid(&root));

        let bad = json!({"b": {"a": {"b": {"count": "many"}}}});
        let issues = schema.check(&bad).unwrap_err();
        assert_eq!(issues[0].path, "/b/a/b/count");
    }

    #[test]
    fn self_reference_through_owned_sub_form_and_id() {
        let registry = InMemoryFormRegistry::new();
        registry.register(
            Form::new("tree").with_field(
                Field::new("children", DataType::ObjectArray).with_sub_form_id("tree"),
            ),
        );
        let tree = registry.get_form("tree").unwrap();
        let schema = compile_form(&tree, &registry, &CompileOptions::default()).unwrap();
        assert!(schema.is_valid(&json!({"children": [{"children": [{"children": []}]}]})));
        assert!(!schema.is_valid(&json!({"children": [1]})));
    }

    #[test]
    fn unresolved_reference_is_open_object() {
        let schema = compile(Form::new("x").with_field(Field::new("o", DataType::Object).with_sub_form_id("missing")));
        assert!(schema.is_valid(&json!({"o": {"anything": [1, 2]}})));
        assert!(!schema.is_valid(&json!({"o": 3})));
    }

    #[test]
    fn scalar_authority_at_root() {
        let mut form = Form::new("minecraft:health").with_field(Field::new("value", DataType::Int));
        form.scalar_field_upgrade_name = Some("value".into());
        let schema = compile(form);
        assert!(schema.is_valid(&json!(20)));
        assert!(schema.is_valid(&json!({"value": 20})));
        assert!(!schema.is_valid(&json!("lots")));
    }

    #[test]
    fn cache_is_keyed_by_identity() {
        let compiler = SchemaCompiler::new(Arc::new(NoForms));
        let a = Form::new("x").with_field(Field::new("f", DataType::Int)).into_shared();
        let twin = Arc::new((*a).clone());

        let first = compiler.compile(&a).unwrap();
        let again = compiler.compile(&a).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let other = compiler.compile(&twin).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(compiler.cached_len(), 2);

        assert!(compiler.invalidate(&twin));
        drop(twin);
        assert_eq!(compiler.cached_len(), 1);

        drop(a);
        assert_eq!(compiler.purge_dead(), 1);
        assert_eq!(compiler.cached_len(), 0);
    }

    #[test]
    fn compiler_is_shareable_across_threads() {
        let compiler = Arc::new(SchemaCompiler::new(Arc::new(NoForms)));
        let form = Form::new("x").with_field(Field::new("f", DataType::Int)).into_shared();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let compiler = Arc::clone(&compiler);
                let form = Arc::clone(&form);
                std::thread::spawn(move || compiler.compile(&form).map(|s| s.is_valid(&json!({"f": 1}))))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().unwrap());
        }
        assert_eq!(compiler.cached_len(), 1);
    }
}
