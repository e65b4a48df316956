//! # Rust Type Declarations
//!
//! Generates static `serde` type declarations for a form graph: one struct
//! per form identity, closed enums for string choice lists and untagged
//! enums for fields with alternates. Recursive forms are emitted once and
//! referenced by name; object fields are boxed so recursive structs have a
//! finite size.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use formdef_core::{DataType, Field, Form, FormRegistry};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "yield",
];

/// Shared shapes emitted after the generated types, only when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Helper {
    IntBoolean,
    Version,
    Point2,
    Point3,
    IntPoint3,
    IntRange,
    FloatRange,
}

impl Helper {
    const ALL: [Helper; 7] = [
        Self::IntBoolean,
        Self::Version,
        Self::Point2,
        Self::Point3,
        Self::IntPoint3,
        Self::IntRange,
        Self::FloatRange,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::IntBoolean => "IntBoolean",
            Self::Version => "Version",
            Self::Point2 => "Point2",
            Self::Point3 => "Point3",
            Self::IntPoint3 => "IntPoint3",
            Self::IntRange => "IntRange",
            Self::FloatRange => "FloatRange",
        }
    }

    fn declaration(self) -> String {
        let derive = "#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n#[serde(untagged)]";
        match self {
            Self::IntBoolean => format!("{derive}\npub enum IntBoolean {{\n    Bool(bool),\n    Int(u8),\n}}\n"),
            Self::Version => format!("{derive}\npub enum Version {{\n    Text(String),\n    Parts([u32; 3]),\n}}\n"),
            Self::Point2 => format!(
                "{derive}\npub enum Point2 {{\n    Tuple([f64; 2]),\n    Named {{ x: f64, y: f64 }},\n}}\n"
            ),
            Self::Point3 => format!(
                "{derive}\npub enum Point3 {{\n    Tuple([f64; 3]),\n    Named {{ x: f64, y: f64, z: f64 }},\n}}\n"
            ),
            Self::IntPoint3 => format!(
                "{derive}\npub enum IntPoint3 {{\n    Tuple([i64; 3]),\n    Named {{ x: i64, y: i64, z: i64 }},\n}}\n"
            ),
            Self::IntRange => range(derive, "IntRange", "i64"),
            Self::FloatRange => range(derive, "FloatRange", "f64"),
        }
    }
}

fn range(derive: &str, name: &str, bound: &str) -> String {
    format!(
        "{derive}\npub enum {name} {{\n    Exact({bound}),\n    Pair([{bound}; 2]),\n    Bounds {{\n        \
         #[serde(default, skip_serializing_if = \"Option::is_none\")]\n        min: Option<{bound}>,\n        \
         #[serde(default, skip_serializing_if = \"Option::is_none\")]\n        max: Option<{bound}>,\n    }},\n}}\n"
    )
}

/// Generate Rust declarations for `form` and every form it references.
pub fn generate_rust_types(form: &Arc<Form>, registry: &dyn FormRegistry) -> String {
    let mut generator = Generator {
        registry,
        items: Vec::new(),
        structs: HashMap::new(),
        scalar_enums: HashMap::new(),
        taken: Helper::ALL.iter().map(|h| h.name().to_string()).collect(),
        helpers: BTreeSet::new(),
        pinned: Vec::new(),
    };
    let root = generator.struct_name(form, "Root");
    if form.scalar_authority().is_some() {
        generator.scalar_enum(form, &root);
    }
    tracing::debug!(
        form = %form.display_id(),
        forms = generator.pinned.len(),
        items = generator.items.len(),
        "generated Rust declarations"
    );

    let mut out = String::new();
    out.push_str("// Generated by formdef. Do not edit.\n\n");
    out.push_str("use std::collections::BTreeMap;\n\n");
    out.push_str("use serde::{Deserialize, Serialize};\n");
    for item in &generator.items {
        out.push('\n');
        out.push_str(item);
    }
    for helper in &generator.helpers {
        out.push('\n');
        out.push_str(&helper.declaration());
    }
    out
}

/// `minecraft:block_light` → `MinecraftBlockLight`.
pub fn pascal_case(raw: &str) -> String {
    let mut out = String::new();
    for word in raw.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.is_empty() {
        return "Unnamed".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'T');
    }
    out
}

/// `isSolid` → `is_solid`, with keywords escaped.
pub fn snake_case(raw: &str) -> String {
    let mut out = String::new();
    let mut previous_lower = false;
    for c in raw.chars() {
        if c.is_ascii_uppercase() {
            if previous_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            previous_lower = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            previous_lower = true;
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            previous_lower = false;
        }
    }
    let out = out.trim_end_matches('_').to_string();
    if out.is_empty() {
        return "field".to_string();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("field_{out}");
    }
    if KEYWORDS.contains(&out.as_str()) {
        return format!("r#{out}");
    }
    out
}

fn doc(out: &mut String, indent: &str, text: Option<&str>) {
    if let Some(text) = text {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(out, "{indent}/// {}", line.trim());
        }
    }
}

struct Generator<'a> {
    registry: &'a dyn FormRegistry,
    items: Vec<String>,
    structs: HashMap<usize, String>,
    scalar_enums: HashMap<usize, String>,
    taken: HashSet<String>,
    helpers: BTreeSet<Helper>,
    pinned: Vec<Arc<Form>>,
}

impl Generator<'_> {
    fn unique(&mut self, base: String) -> String {
        let mut name = base.clone();
        let mut n = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    fn helper(&mut self, helper: Helper) -> String {
        self.helpers.insert(helper);
        helper.name().to_string()
    }

    fn resolve(&self, field: &Field) -> Option<Arc<Form>> {
        if let Some(sub) = &field.sub_form {
            return Some(Arc::clone(sub));
        }
        self.registry.get_form(field.sub_form_id.as_deref()?)
    }

    /// Struct name for `form`, emitting the struct on first use.
    fn struct_name(&mut self, form: &Arc<Form>, hint: &str) -> String {
        let key = Arc::as_ptr(form) as usize;
        if let Some(name) = self.structs.get(&key) {
            return name.clone();
        }
        let base = form.id.as_deref().map_or_else(|| hint.to_string(), pascal_case);
        let name = self.unique(base);
        self.structs.insert(key, name.clone());
        self.pinned.push(Arc::clone(form));

        let slot = self.items.len();
        self.items.push(String::new());
        let declaration = self.declare_struct(form, &name);
        self.items[slot] = declaration;
        name
    }

    /// `{Name}Value`: the form or its bare scalar.
    fn scalar_enum(&mut self, form: &Arc<Form>, struct_name: &str) -> String {
        let key = Arc::as_ptr(form) as usize;
        if let Some(name) = self.scalar_enums.get(&key) {
            return name.clone();
        }
        let name = self.unique(format!("{struct_name}Value"));
        self.scalar_enums.insert(key, name.clone());

        let scalar = match form.scalar_authority() {
            Some(authority) => self.field_type(authority, struct_name),
            None => "serde_json::Value".to_string(),
        };
        let mut out = String::new();
        let _ = writeln!(out, "/// `{struct_name}` or its bare scalar shorthand.");
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n#[serde(untagged)]\n");
        let _ = writeln!(out, "pub enum {name} {{");
        let _ = writeln!(out, "    Full(Box<{struct_name}>),");
        let _ = writeln!(out, "    Scalar({scalar}),");
        out.push_str("}\n");
        self.items.push(out);
        name
    }

    fn declare_struct(&mut self, form: &Form, name: &str) -> String {
        let mut body = String::new();
        for field in &form.fields {
            let ty = self.field_type(field, name);
            let ident = snake_case(&field.id);
            let required = field.is_required_on_any_variant();

            let mut attrs = Vec::new();
            if ident.trim_start_matches("r#") != field.id {
                attrs.push(format!("rename = \"{}\"", field.id));
            }
            if let Some(alt) = &field.alt_id {
                attrs.push(format!("alias = \"{alt}\""));
            }
            if !required {
                attrs.push("default".to_string());
                attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
            }

            doc(&mut body, "    ", field.title.as_deref().or(field.description.as_deref()));
            if field.is_deprecated {
                body.push_str("    #[deprecated]\n");
            }
            if !attrs.is_empty() {
                let _ = writeln!(body, "    #[serde({})]", attrs.join(", "));
            }
            if required {
                let _ = writeln!(body, "    pub {ident}: {ty},");
            } else {
                let _ = writeln!(body, "    pub {ident}: Option<{ty}>,");
            }
        }
        if let Some(custom) = form.custom_field.as_deref() {
            let ty = self.field_type(custom, name);
            body.push_str("    #[serde(flatten)]\n");
            let _ = writeln!(body, "    pub extra: BTreeMap<String, {ty}>,");
        }

        let mut out = String::new();
        doc(&mut out, "", form.title.as_deref().or(form.description.as_deref()));
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        let _ = writeln!(out, "pub struct {name} {{");
        out.push_str(&body);
        out.push_str("}\n");
        out
    }

    /// Type of a field, folding alternates into an untagged enum.
    fn field_type(&mut self, field: &Field, owner: &str) -> String {
        if field.alternates.is_empty() {
            return self.variant_type(field, owner);
        }
        let name = self.unique(format!("{owner}{}", pascal_case(&field.id)));
        let mut used = HashSet::new();
        let mut variants = String::new();
        for variant in field.variants() {
            let ty = self.variant_type(variant, owner);
            let base = pascal_case(variant.data_type.name());
            let mut label = base.clone();
            let mut n = 2;
            while !used.insert(label.clone()) {
                label = format!("{base}{n}");
                n += 1;
            }
            let _ = writeln!(variants, "    {label}({ty}),");
        }
        let mut out = String::new();
        doc(&mut out, "", field.title.as_deref());
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n#[serde(untagged)]\n");
        let _ = writeln!(out, "pub enum {name} {{");
        out.push_str(&variants);
        out.push_str("}\n");
        self.items.push(out);
        name
    }

    fn choice_enum(&mut self, field: &Field, owner: &str) -> Option<String> {
        let labels: Vec<&str> = field.choices.iter().map(|c| c.id.as_str()).collect::<Option<_>>()?;
        let name = self.unique(format!("{owner}{}", pascal_case(&field.id)));
        let mut used = HashSet::new();
        let mut out = String::new();
        doc(&mut out, "", field.title.as_deref());
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]\n");
        let _ = writeln!(out, "pub enum {name} {{");
        for (choice, label) in field.choices.iter().zip(labels) {
            let base = pascal_case(label);
            let mut variant = base.clone();
            let mut n = 2;
            while !used.insert(variant.clone()) {
                variant = format!("{base}{n}");
                n += 1;
            }
            doc(&mut out, "    ", choice.title.as_deref());
            let _ = writeln!(out, "    #[serde(rename = \"{label}\")]");
            let _ = writeln!(out, "    {variant},");
        }
        out.push_str("}\n");
        self.items.push(out);
        Some(name)
    }

    fn object_type(&mut self, field: &Field, owner: &str) -> String {
        match self.resolve(field) {
            Some(sub) => {
                let hint = format!("{owner}{}", pascal_case(&field.id));
                self.struct_name(&sub, &hint)
            }
            None => "serde_json::Map<String, serde_json::Value>".to_string(),
        }
    }

    fn variant_type(&mut self, field: &Field, owner: &str) -> String {
        use DataType as T;
        match field.data_type {
            T::Int | T::IntValueLookup | T::Long | T::IntEnum => "i64".to_string(),
            T::Float | T::Number => "f64".to_string(),
            T::Boolean => "bool".to_string(),
            T::IntBoolean => self.helper(Helper::IntBoolean),
            T::Version => self.helper(Helper::Version),
            T::Point2 => self.helper(Helper::Point2),
            T::Point3 => self.helper(Helper::Point3),
            T::IntPoint3 => self.helper(Helper::IntPoint3),
            T::IntRange => self.helper(Helper::IntRange),
            T::FloatRange | T::PercentRange => self.helper(Helper::FloatRange),
            T::StringEnum if !field.choices.is_empty() => self
                .choice_enum(field, owner)
                .unwrap_or_else(|| "String".to_string()),
            T::Object => match self.resolve(field) {
                Some(sub) => {
                    let hint = format!("{owner}{}", pascal_case(&field.id));
                    let name = self.struct_name(&sub, &hint);
                    if sub.scalar_authority().is_some() {
                        self.scalar_enum(&sub, &name)
                    } else {
                        format!("Box<{name}>")
                    }
                }
                None => match field.custom_field.as_deref() {
                    Some(custom) => format!("BTreeMap<String, {}>", self.field_type(custom, owner)),
                    None => "serde_json::Map<String, serde_json::Value>".to_string(),
                },
            },
            T::KeyedObjectCollection => format!("BTreeMap<String, {}>", self.object_type(field, owner)),
            T::ObjectArray => format!("Vec<{}>", self.object_type(field, owner)),
            T::FilterExpression | T::EventTrigger | T::MolangExpression => "serde_json::Value".to_string(),
            t if t.is_string() => "String".to_string(),
            t if t.is_keyed_collection() || t.is_array() => match t.element_type() {
                Some(element) => {
                    let inner = self.variant_type(&Field::new("", element), owner);
                    if t.is_array() {
                        format!("Vec<{inner}>")
                    } else {
                        format!("BTreeMap<String, {inner}>")
                    }
                }
                None => "serde_json::Value".to_string(),
            },
            _ => "serde_json::Value".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formdef_core::{Choice, InMemoryFormRegistry, NoForms};

    #[test]
    fn case_conversion() {
        assert_eq!(pascal_case("minecraft:block_light"), "MinecraftBlockLight");
        assert_eq!(pascal_case("3d"), "T3d");
        assert_eq!(snake_case("isSolid"), "is_solid");
        assert_eq!(snake_case("minecraft:health"), "minecraft_health");
        assert_eq!(snake_case("type"), "r#type");
    }

    #[test]
    fn struct_with_optional_and_required_fields() {
        let form = Form::new("minecraft:light_block")
            .with_title("Light block")
            .with_field(Field::new("luminance", DataType::Int).required())
            .with_field(Field::new("isSolid", DataType::Boolean).with_title("Solid"))
            .into_shared();
        let out = generate_rust_types(&form, &NoForms);
        assert!(out.contains("/// Light block\n"));
        assert!(out.contains("pub struct MinecraftLightBlock {"));
        assert!(out.contains("    pub luminance: i64,"));
        assert!(out.contains("#[serde(rename = \"isSolid\", default, skip_serializing_if = \"Option::is_none\")]"));
        assert!(out.contains("    pub is_solid: Option<bool>,"));
    }

    #[test]
    fn choices_alternates_and_helpers() {
        let form = Form::new("x")
            .with_field(
                Field::new("mode", DataType::StringEnum)
                    .with_choices(vec![Choice::new("on"), Choice::new("off")]),
            )
            .with_field(Field::new("size", DataType::Int).with_alternate(Field::new("size", DataType::IntRange)))
            .into_shared();
        let out = generate_rust_types(&form, &NoForms);
        assert!(out.contains("pub enum XMode {"));
        assert!(out.contains("    #[serde(rename = \"on\")]\n    On,"));
        assert!(out.contains("pub enum XSize {"));
        assert!(out.contains("    Int(i64),"));
        assert!(out.contains("    IntRange(IntRange),"));
        assert!(out.contains("pub enum IntRange {"));
        assert!(!out.contains("pub enum Point3"));
    }

    #[test]
    fn recursive_forms_are_emitted_once() {
        let registry = InMemoryFormRegistry::new();
        registry.register(
            Form::new("tree")
                .with_field(Field::new("children", DataType::ObjectArray).with_sub_form_id("tree"))
                .with_field(Field::new("parent", DataType::Object).with_sub_form_id("tree")),
        );
        let tree = registry.get_form("tree").unwrap();
        let out = generate_rust_types(&tree, &registry);
        assert_eq!(out.matches("pub struct Tree {").count(), 1);
        assert!(out.contains("pub children: Option<Vec<Tree>>,"));
        assert!(out.contains("pub parent: Option<Box<Tree>>,"));
    }

    #[test]
    fn anonymous_sub_forms_scalar_authority_and_catch_all() {
        let inner = Form::anonymous().with_field(Field::new("value", DataType::Int));
        let mut health = Form::new("health").with_field(Field::new("value", DataType::Int));
        health.scalar_field_upgrade_name = Some("value".into());
        let form = Form::new("entity")
            .with_field(Field::new("stats", DataType::Object).with_sub_form(inner))
            .with_field(Field::new("health", DataType::Object).with_sub_form(health))
            .with_custom_field(Field::new("<any>", DataType::String))
            .into_shared();
        let out = generate_rust_types(&form, &NoForms);
        assert!(out.contains("pub struct EntityStats {"));
        assert!(out.contains("pub enum HealthValue {"));
        assert!(out.contains("    Full(Box<Health>),\n    Scalar(i64),"));
        assert!(out.contains("pub health: Option<HealthValue>,"));
        assert!(out.contains("    #[serde(flatten)]\n    pub extra: BTreeMap<String, String>,"));
    }
}
