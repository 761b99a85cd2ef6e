use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Kind of a resolved type expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Scalar,
    Object,
    Array,
    Any,
    Nil,
}

/// Resolved form of a type expression: its kind and canonical name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    pub name: String,
}

impl TypeDescriptor {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Result of resolving a type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub descriptor: TypeDescriptor,
    /// Names that must exist as standalone type definitions
    pub dependents: Vec<String>,
}

impl Resolved {
    fn leaf(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            descriptor: TypeDescriptor::new(kind, name),
            dependents: Vec::new(),
        }
    }

    fn named(kind: TypeKind, name: &str) -> Self {
        Self {
            descriptor: TypeDescriptor::new(kind, name),
            dependents: vec![name.to_string()],
        }
    }
}

/// Constraints attached to a primitive type definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, rename = "minLength", alias = "min_length", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, rename = "maxLength", alias = "max_length", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl Facets {
    /// Sets both length bounds
    pub fn with_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self.max_length = Some(length);
        self
    }
}

/// Field of a structured type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub descriptor: TypeDescriptor,
    pub optional: bool,
}

/// A registered, named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDefinition {
    /// An API primitive with facet constraints, e.g. `uuid` as a patterned string
    Primitive {
        name: String,
        base: String,
        facets: Facets,
    },
    /// A key/value map synthesized from a `map[K]V` expression
    Map {
        name: String,
        key: TypeDescriptor,
        value: TypeDescriptor,
    },
    /// A type derived from a Rust struct layout
    Structure {
        name: String,
        fields: Vec<FieldDefinition>,
    },
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Primitive { name, .. }
            | TypeDefinition::Map { name, .. }
            | TypeDefinition::Structure { name, .. } => name,
        }
    }
}

/// Field of a Rust struct, reduced to a type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub expression: String,
    pub optional: bool,
}

/// Field layout of a Rust struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
}

/// Variants of a fieldless Rust enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumLayout {
    pub name: String,
    pub variants: Vec<String>,
}

/// A type declaration found in Rust source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLayout {
    Struct(StructLayout),
    Enum(EnumLayout),
}

/// Serde attributes that matter for the field layout
#[derive(Debug, Clone, Default)]
struct SerdeAttributes {
    rename: Option<String>,
    skip: bool,
    default: bool,
}

impl StructLayout {
    /// Reads the named fields of a struct
    pub fn from_item_struct(item_struct: &syn::ItemStruct) -> Self {
        let name = item_struct.ident.to_string();
        debug!("Reading struct layout: {}", name);

        let mut fields = Vec::new();
        if let syn::Fields::Named(named_fields) = &item_struct.fields {
            for field in &named_fields.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                let serde_attrs = parse_serde_attributes(&field.attrs);
                if serde_attrs.skip {
                    continue;
                }
                let expression = type_expression(&field.ty);
                let optional = expression.starts_with('*') || serde_attrs.default;
                fields.push(FieldLayout {
                    name: serde_attrs.rename.unwrap_or_else(|| ident.to_string()),
                    expression,
                    optional,
                });
            }
        }

        Self { name, fields }
    }
}

impl EnumLayout {
    /// Reads an enum if all of its variants are units
    pub fn from_item_enum(item_enum: &syn::ItemEnum) -> Option<Self> {
        if item_enum
            .variants
            .iter()
            .any(|v| !matches!(v.fields, syn::Fields::Unit))
        {
            return None;
        }
        let variants = item_enum
            .variants
            .iter()
            .map(|v| {
                parse_serde_attributes(&v.attrs)
                    .rename
                    .unwrap_or_else(|| v.ident.to_string())
            })
            .collect();
        Some(Self {
            name: item_enum.ident.to_string(),
            variants,
        })
    }
}

/// Collects struct and unit-enum layouts of a parsed file, inline modules included
pub fn collect_layouts(file: &syn::File) -> Vec<TypeLayout> {
    let mut layouts = Vec::new();
    collect_from_items(&file.items, &mut layouts);
    layouts
}

fn collect_from_items(items: &[syn::Item], layouts: &mut Vec<TypeLayout>) {
    for item in items {
        match item {
            syn::Item::Struct(item_struct) => {
                layouts.push(TypeLayout::Struct(StructLayout::from_item_struct(item_struct)))
            }
            syn::Item::Enum(item_enum) => {
                if let Some(layout) = EnumLayout::from_item_enum(item_enum) {
                    layouts.push(TypeLayout::Enum(layout));
                }
            }
            syn::Item::Mod(item_mod) => {
                if let Some((_, items)) = &item_mod.content {
                    collect_from_items(items, layouts);
                }
            }
            _ => {}
        }
    }
}

fn parse_serde_attributes(attrs: &[syn::Attribute]) -> SerdeAttributes {
    static RENAME_RE: OnceLock<Regex> = OnceLock::new();
    let rename_re =
        RENAME_RE.get_or_init(|| Regex::new(r#"\brename\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    let mut serde_attrs = SerdeAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let Ok(meta_list) = attr.meta.require_list() else {
            continue;
        };
        let tokens = meta_list.tokens.to_string();

        if let Some(caps) = rename_re.captures(&tokens) {
            serde_attrs.rename = Some(caps[1].to_string());
        }
        if tokens
            .split(',')
            .any(|part| matches!(part.trim(), "skip" | "skip_serializing"))
        {
            serde_attrs.skip = true;
        }
        if tokens.contains("default") || tokens.contains("skip_serializing_if") {
            serde_attrs.default = true;
        }
    }
    serde_attrs
}

/// Turns a Rust type into a type expression (`*T`, `[]T`, `map[K]V` or a name)
pub fn type_expression(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(type_path) => path_expression(&type_path.path),
        syn::Type::Reference(reference) => type_expression(&reference.elem),
        syn::Type::Paren(paren) => type_expression(&paren.elem),
        syn::Type::Group(group) => type_expression(&group.elem),
        syn::Type::Slice(slice) => format!("[]{}", type_expression(&slice.elem)),
        syn::Type::Array(array) => format!("[]{}", type_expression(&array.elem)),
        syn::Type::Tuple(tuple) if tuple.elems.is_empty() => "nil".to_string(),
        _ => "any".to_string(),
    }
}

fn path_expression(path: &syn::Path) -> String {
    let Some(segment) = path.segments.last() else {
        return "any".to_string();
    };
    let name = segment.ident.to_string();

    let args: Vec<&syn::Type> = match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    match (name.as_str(), args.as_slice()) {
        ("Option", [inner]) => format!("*{}", type_expression(inner)),
        ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet", [inner, ..]) => {
            format!("[]{}", type_expression(inner))
        }
        ("HashMap" | "BTreeMap" | "IndexMap", [key, value, ..]) => {
            format!("map[{}]{}", type_expression(key), type_expression(value))
        }
        ("Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell", [inner]) => type_expression(inner),
        _ => name,
    }
}

/// Canonical scalar name of a built-in type, if it is one
pub fn scalar_name(name: &str) -> Option<&'static str> {
    match name {
        "bool" | "boolean" => Some("boolean"),
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
        | "u64" | "u128" | "usize" | "integer" => Some("integer"),
        "float32" | "float64" | "f32" | "f64" | "number" => Some("number"),
        "string" | "String" | "str" | "char" => Some("string"),
        "date" | "datetime" | "time.Time" | "DateTime" | "NaiveDateTime" | "NaiveDate"
        | "SystemTime" => Some("datetime"),
        "file" | "multipart.FileHeader" => Some("file"),
        _ => None,
    }
}

fn map_re() -> &'static Regex {
    static MAP_RE: OnceLock<Regex> = OnceLock::new();
    MAP_RE.get_or_init(|| Regex::new(r"^map\[([^\]]+)\](.+)$").expect("Invalid regex"))
}

/// Name fragment of a map key or value: `boolean[]` becomes `Arrayboolean`
fn map_component(name: &str) -> String {
    let mut base = name;
    let mut depth = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        depth += 1;
    }
    let base: String = base
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .collect();
    format!("{}{}", "Array".repeat(depth), base.replace('|', "Or"))
}

/// Splits a union on ` | ` separators that are not inside parentheses
fn split_union(expr: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 && expr[i..].starts_with(" | ") => {
                parts.push(&expr[start..i]);
                start = i + 3;
                i += 3;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&expr[start..]);
    parts
}

/// Strips one pair of parentheses wrapping the whole expression
fn strip_parens(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Registry of named types, aliases and synthesized maps
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    definitions: IndexMap<String, TypeDefinition>,
    aliases: IndexMap<String, String>,
    /// Field layouts of registered structures, resolved by `resolve_structures`
    structures: IndexMap<String, Vec<FieldLayout>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.definitions.contains_key(name) || self.aliases.contains_key(name) {
            return Err(Error::TypeAlreadyDefined(name.to_string()));
        }
        Ok(())
    }

    fn is_known(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
            || self.aliases.contains_key(name)
            || scalar_name(name).is_some()
            || matches!(name, "any" | "nil")
    }

    /// Registers a primitive API type, e.g. `uuid` as a string with a pattern
    pub fn define_primitive(&mut self, name: &str, base: &str, facets: Facets) -> Result<()> {
        self.ensure_free(name)?;
        debug!("Defining primitive {} ({})", name, base);
        self.definitions.insert(
            name.to_string(),
            TypeDefinition::Primitive {
                name: name.to_string(),
                base: base.to_string(),
                facets,
            },
        );
        Ok(())
    }

    /// Registers a structured type under `name`.
    ///
    /// The fields stay unresolved until [`TypeRegistry::resolve_structures`] runs, so they
    /// may refer to types registered later. When the Rust identifier differs from `name`
    /// it becomes an alias of it.
    pub fn define_structure(&mut self, name: &str, layout: &StructLayout) -> Result<()> {
        self.ensure_free(name)?;
        debug!("Defining structure {} with {} fields", name, layout.fields.len());

        if layout.name != name && !self.is_known(&layout.name) {
            self.aliases.insert(layout.name.clone(), name.to_string());
        }

        self.definitions.insert(
            name.to_string(),
            TypeDefinition::Structure {
                name: name.to_string(),
                fields: Vec::new(),
            },
        );
        self.structures.insert(name.to_string(), layout.fields.clone());
        Ok(())
    }

    /// Resolves the fields of every registered structure against the current registry.
    ///
    /// A field whose expression fails to resolve is left out with a warning.
    pub fn resolve_structures(&mut self) {
        let structures: Vec<(String, Vec<FieldLayout>)> = self
            .structures
            .iter()
            .map(|(name, fields)| (name.clone(), fields.clone()))
            .collect();

        for (name, layouts) in structures {
            let mut fields = Vec::with_capacity(layouts.len());
            for field in &layouts {
                match self.resolve(&field.expression) {
                    Ok(resolved) => fields.push(FieldDefinition {
                        name: field.name.clone(),
                        descriptor: resolved.descriptor,
                        optional: field.optional,
                    }),
                    Err(e) => warn!("Skipping field {}.{}: {}", name, field.name, e),
                }
            }
            debug!("Resolved {} fields of {}", fields.len(), name);
            self.definitions
                .insert(name.clone(), TypeDefinition::Structure { name, fields });
        }
    }

    /// Registers a fieldless enum as a string primitive listing its variants
    pub fn define_enum(&mut self, name: &str, layout: &EnumLayout) -> Result<()> {
        let facets = Facets {
            enum_values: Some(layout.variants.clone()),
            ..Facets::default()
        };
        self.define_primitive(name, "string", facets)
    }

    /// Registers `alias` as another name for the already known type `target`
    pub fn define_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        if alias == target {
            return Err(Error::AliasCycle(alias.to_string()));
        }
        self.ensure_free(alias)?;
        if !self.is_known(target) {
            return Err(Error::UnknownAliasTarget {
                alias: alias.to_string(),
                target: target.to_string(),
            });
        }
        debug!("Defining alias {} -> {}", alias, target);
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    /// Definition registered under `name`, following aliases
    pub fn definition(&self, name: &str) -> Option<&TypeDefinition> {
        let mut current = name;
        let mut hops = 0;
        while let Some(target) = self.aliases.get(current) {
            current = target;
            hops += 1;
            if hops > self.aliases.len() {
                return None;
            }
        }
        self.definitions.get(current)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolves a type expression into its descriptor and dependent type names.
    ///
    /// Resolving `map[K]V` registers a map definition the first time it is seen.
    pub fn resolve(&mut self, expr: &str) -> Result<Resolved> {
        let mut trail = Vec::new();
        self.resolve_inner(expr.trim(), &mut trail)
    }

    fn resolve_inner(&mut self, expr: &str, trail: &mut Vec<String>) -> Result<Resolved> {
        let expr = expr.trim();

        let members = split_union(expr);
        if members.len() > 1 {
            return self.resolve_union(&members, trail);
        }

        if let Some(inner) = strip_parens(expr) {
            return self.resolve_inner(inner, trail);
        }

        match expr {
            "" | "nil" => return Ok(Resolved::leaf(TypeKind::Nil, "nil")),
            "any" | "interface{}" => return Ok(Resolved::leaf(TypeKind::Any, "any")),
            _ => {}
        }

        if let Some(TypeDefinition::Primitive { base, .. }) = self.definitions.get(expr) {
            let kind = if scalar_name(base).is_some() {
                TypeKind::Scalar
            } else {
                TypeKind::Object
            };
            return Ok(Resolved::named(kind, expr));
        }

        if let Some(target) = self.aliases.get(expr).cloned() {
            if target == expr || trail.iter().any(|seen| seen == expr) {
                return Err(Error::AliasCycle(expr.to_string()));
            }
            trail.push(expr.to_string());
            return self.resolve_inner(&target, trail);
        }

        if let Some(rest) = expr.strip_prefix('*').filter(|rest| !rest.is_empty()) {
            return self.resolve_inner(rest, trail);
        }

        let element = expr
            .strip_prefix("[]")
            .or_else(|| expr.strip_suffix("[]"))
            .filter(|rest| !rest.is_empty());
        if let Some(element) = element {
            let inner = self.resolve_inner(element, trail)?;
            let name = if split_union(&inner.descriptor.name).len() > 1 {
                format!("({})[]", inner.descriptor.name)
            } else {
                format!("{}[]", inner.descriptor.name)
            };
            return Ok(Resolved {
                descriptor: TypeDescriptor::new(TypeKind::Array, name),
                dependents: inner.dependents,
            });
        }

        if expr.starts_with("map[") {
            return self.resolve_map(expr, trail);
        }

        if let Some(scalar) = scalar_name(expr) {
            return Ok(Resolved::leaf(TypeKind::Scalar, scalar));
        }

        Ok(Resolved::named(TypeKind::Object, expr))
    }

    fn resolve_union(&mut self, members: &[&str], trail: &[String]) -> Result<Resolved> {
        let mut names = Vec::with_capacity(members.len());
        let mut kinds = Vec::with_capacity(members.len());
        let mut dependents = Vec::new();
        for member in members {
            let mut member_trail = trail.to_vec();
            let resolved = self.resolve_inner(member, &mut member_trail)?;
            kinds.push(resolved.descriptor.kind);
            names.push(resolved.descriptor.name);
            dependents.extend(resolved.dependents);
        }
        let kind = if kinds.windows(2).all(|pair| pair[0] == pair[1]) {
            kinds[0]
        } else {
            TypeKind::Any
        };
        Ok(Resolved {
            descriptor: TypeDescriptor::new(kind, names.join(" | ")),
            dependents,
        })
    }

    fn resolve_map(&mut self, expr: &str, trail: &mut Vec<String>) -> Result<Resolved> {
        let caps = map_re()
            .captures(expr)
            .ok_or_else(|| Error::MalformedMap(expr.to_string()))?;
        let (key_expr, value_expr) = (caps[1].to_string(), caps[2].to_string());

        let key = self.resolve_inner(&key_expr, &mut trail.clone())?;
        let value = self.resolve_inner(&value_expr, &mut trail.clone())?;
        let name = format!(
            "map_{}_{}",
            map_component(&key.descriptor.name),
            map_component(&value.descriptor.name)
        );

        if !self.definitions.contains_key(&name) {
            debug!("Creating map type {} for {}", name, expr);
            self.definitions.insert(
                name.clone(),
                TypeDefinition::Map {
                    name: name.clone(),
                    key: key.descriptor,
                    value: value.descriptor,
                },
            );
        }

        let mut dependents = vec![name.clone()];
        dependents.extend(key.dependents);
        dependents.extend(value.dependents);
        Ok(Resolved {
            descriptor: TypeDescriptor::new(TypeKind::Object, name),
            dependents,
        })
    }

    /// Type names a registered definition refers to, for recursive registration
    pub fn dependents_of(&mut self, name: &str) -> Vec<String> {
        let referenced: Vec<String> = match self.definition(name) {
            Some(TypeDefinition::Map { key, value, .. }) => {
                vec![key.name.clone(), value.name.clone()]
            }
            Some(TypeDefinition::Structure { fields, .. }) => fields
                .iter()
                .map(|field| field.descriptor.name.clone())
                .collect(),
            Some(TypeDefinition::Primitive { .. }) | None => return Vec::new(),
        };

        let mut dependents = Vec::new();
        for type_name in referenced {
            match self.resolve(&type_name) {
                Ok(resolved) => dependents.extend(resolved.dependents),
                Err(e) => warn!("Could not resolve {} referenced by {}: {}", type_name, name, e),
            }
        }
        dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_layouts(code: &str) -> Vec<TypeLayout> {
        let file = syn::parse_file(code).unwrap();
        collect_layouts(&file)
    }

    fn first_struct(code: &str) -> StructLayout {
        match parse_layouts(code).into_iter().next() {
            Some(TypeLayout::Struct(layout)) => layout,
            other => panic!("Expected struct layout, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_scalars() {
        let mut registry = TypeRegistry::new();
        let cases = vec![
            ("bool", "boolean"),
            ("int64", "integer"),
            ("u32", "integer"),
            ("f64", "number"),
            ("String", "string"),
            ("time.Time", "datetime"),
            ("multipart.FileHeader", "file"),
        ];
        for (expr, expected) in cases {
            let resolved = registry.resolve(expr).unwrap();
            assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Scalar, expected));
            assert!(resolved.dependents.is_empty());
        }
    }

    #[test]
    fn test_resolve_array_of_object() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("[]Book").unwrap();
        assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Array, "Book[]"));
        assert_eq!(resolved.dependents, vec!["Book"]);
    }

    #[test]
    fn test_resolve_pointer_forwards_inner() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("*[]int").unwrap();
        assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Array, "integer[]"));
        assert!(resolved.dependents.is_empty());
    }

    #[test]
    fn test_resolve_any_and_nil() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.resolve("").unwrap().descriptor.kind, TypeKind::Nil);
        assert_eq!(registry.resolve("nil").unwrap().descriptor.kind, TypeKind::Nil);
        assert_eq!(registry.resolve("interface{}").unwrap().descriptor.kind, TypeKind::Any);
        assert_eq!(registry.resolve("any").unwrap().descriptor.kind, TypeKind::Any);
    }

    #[test]
    fn test_resolve_map_registers_once() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("map[string]int").unwrap();
        assert_eq!(
            resolved.descriptor,
            TypeDescriptor::new(TypeKind::Object, "map_string_integer")
        );
        assert_eq!(resolved.dependents, vec!["map_string_integer"]);
        assert_eq!(registry.len(), 1);

        registry.resolve("map[string]int").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.definition("map_string_integer"),
            Some(&TypeDefinition::Map {
                name: "map_string_integer".into(),
                key: TypeDescriptor::new(TypeKind::Scalar, "string"),
                value: TypeDescriptor::new(TypeKind::Scalar, "integer"),
            })
        );
    }

    #[test]
    fn test_resolve_map_of_arrays_and_objects() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("map[string][]bool").unwrap();
        assert_eq!(resolved.descriptor.name, "map_string_Arrayboolean");

        let resolved = registry.resolve("map[string]Author").unwrap();
        assert_eq!(resolved.dependents, vec!["map_string_Author", "Author"]);
    }

    #[test]
    fn test_malformed_map() {
        let mut registry = TypeRegistry::new();
        assert!(matches!(registry.resolve("map[string"), Err(Error::MalformedMap(_))));
        assert!(matches!(registry.resolve("map[]int"), Err(Error::MalformedMap(_))));
    }

    #[test]
    fn test_resolve_union() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("Book | []Author").unwrap();
        assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Any, "Book | Author[]"));
        assert_eq!(resolved.dependents, vec!["Book", "Author"]);

        let resolved = registry.resolve("int | float64").unwrap();
        assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Scalar, "integer | number"));
    }

    #[test]
    fn test_array_of_union_keeps_grouping() {
        let mut registry = TypeRegistry::new();
        let resolved = registry.resolve("[](string | Book)").unwrap();
        assert_eq!(resolved.descriptor.name, "(string | Book)[]");
        let again = registry.resolve(&resolved.descriptor.name).unwrap();
        assert_eq!(again.descriptor, resolved.descriptor);
    }

    #[test]
    fn test_canonical_names_are_fixed_points() {
        let mut registry = TypeRegistry::new();
        registry
            .define_primitive("uuid", "string", Facets::default())
            .unwrap();
        for expr in ["[]Book", "*int", "map[string][]Book", "uuid", "Book | nil", "[][]float32"] {
            let first = registry.resolve(expr).unwrap();
            let definitions = registry.len();
            let second = registry.resolve(&first.descriptor.name).unwrap();
            assert_eq!(second.descriptor, first.descriptor, "for {}", expr);
            assert!(second.dependents.iter().all(|d| first.dependents.contains(d)));
            assert_eq!(registry.len(), definitions);
        }
    }

    #[test]
    fn test_primitive_resolves_to_itself() {
        let mut registry = TypeRegistry::new();
        let facets = Facets {
            pattern: Some("[a-f0-9-]+".into()),
            ..Facets::default()
        }
        .with_length(36);
        registry.define_primitive("uuid", "string", facets).unwrap();

        let resolved = registry.resolve("uuid").unwrap();
        assert_eq!(resolved.descriptor, TypeDescriptor::new(TypeKind::Scalar, "uuid"));
        assert_eq!(resolved.dependents, vec!["uuid"]);
    }

    #[test]
    fn test_alias_resolution() {
        let mut registry = TypeRegistry::new();
        registry
            .define_primitive("uuid", "string", Facets::default())
            .unwrap();
        registry.define_alias("BookId", "uuid").unwrap();
        registry.define_alias("Timestamp", "datetime").unwrap();

        assert_eq!(registry.resolve("BookId").unwrap().descriptor.name, "uuid");
        assert_eq!(
            registry.resolve("[]Timestamp").unwrap().descriptor,
            TypeDescriptor::new(TypeKind::Array, "datetime[]")
        );
    }

    #[test]
    fn test_self_alias_is_a_cycle() {
        let mut registry = TypeRegistry::new();
        registry
            .define_primitive("X", "string", Facets::default())
            .unwrap();
        assert!(matches!(registry.define_alias("X", "X"), Err(Error::AliasCycle(_))));
        assert!(matches!(registry.define_alias("Y", "Y"), Err(Error::AliasCycle(_))));
    }

    #[test]
    fn test_alias_cycle_detected_during_resolution() {
        let mut registry = TypeRegistry::new();
        registry.aliases.insert("A".into(), "B".into());
        registry.aliases.insert("B".into(), "A".into());
        assert!(matches!(registry.resolve("A"), Err(Error::AliasCycle(_))));
        assert!(matches!(registry.resolve("[]B"), Err(Error::AliasCycle(_))));
    }

    #[test]
    fn test_alias_to_unknown_target() {
        let mut registry = TypeRegistry::new();
        assert!(matches!(
            registry.define_alias("Id", "Nope"),
            Err(Error::UnknownAliasTarget { .. })
        ));
    }

    #[test]
    fn test_definitions_are_not_overwritten() {
        let mut registry = TypeRegistry::new();
        registry
            .define_primitive("uuid", "string", Facets::default())
            .unwrap();
        assert!(matches!(
            registry.define_primitive("uuid", "integer", Facets::default()),
            Err(Error::TypeAlreadyDefined(_))
        ));
    }

    #[test]
    fn test_struct_layout_from_source() {
        let layout = first_struct(
            r#"
            use serde::Serialize;

            #[derive(Serialize)]
            pub struct Book {
                pub id: u32,
                #[serde(rename = "title")]
                pub name: String,
                pub author: Option<Box<Author>>,
                pub tags: Vec<String>,
                pub ratings: HashMap<String, f32>,
                #[serde(skip)]
                pub cache: Vec<u8>,
                #[serde(default)]
                pub stock: i64,
            }
        "#,
        );

        assert_eq!(layout.name, "Book");
        let summary: Vec<(&str, &str, bool)> = layout
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.expression.as_str(), f.optional))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "u32", false),
                ("title", "String", false),
                ("author", "*Author", true),
                ("tags", "[]String", false),
                ("ratings", "map[String]f32", false),
                ("stock", "i64", true),
            ]
        );
    }

    #[test]
    fn test_collect_layouts_includes_unit_enums_and_modules() {
        let layouts = parse_layouts(
            r#"
            pub enum Status { Available, Sold }
            pub enum Event { Created(u32), Deleted }
            pub mod models {
                pub struct Author { pub name: String }
            }
        "#,
        );
        assert_eq!(layouts.len(), 2);
        assert_eq!(
            layouts[0],
            TypeLayout::Enum(EnumLayout {
                name: "Status".into(),
                variants: vec!["Available".into(), "Sold".into()],
            })
        );
        assert!(matches!(&layouts[1], TypeLayout::Struct(s) if s.name == "Author"));
    }

    #[test]
    fn test_define_structure_and_dependents() {
        let mut registry = TypeRegistry::new();
        let layout = first_struct(
            r#"
            pub struct BookRow {
                pub id: u32,
                pub author: Author,
                pub reviews: Vec<Review>,
                pub meta: HashMap<String, Label>,
                pub next: Option<Box<BookRow>>,
            }
        "#,
        );
        registry.define_structure("Book", &layout).unwrap();
        registry.resolve_structures();

        // the Rust identifier is kept as an alias
        assert_eq!(registry.resolve("BookRow").unwrap().descriptor.name, "Book");
        assert!(matches!(
            registry.definition("BookRow"),
            Some(TypeDefinition::Structure { name, .. }) if name == "Book"
        ));

        let dependents = registry.dependents_of("Book");
        assert_eq!(dependents, vec!["Author", "Review", "map_string_Label", "Book"]);
        assert_eq!(registry.dependents_of("map_string_Label"), vec!["Label"]);
    }

    #[test]
    fn test_resolve_map_with_repeated_alias() {
        let mut registry = TypeRegistry::new();
        registry
            .define_primitive("uuid", "string", Facets::default())
            .unwrap();
        registry.define_alias("Id", "uuid").unwrap();

        let resolved = registry.resolve("map[Id]Id").unwrap();
        assert_eq!(resolved.descriptor.name, "map_uuid_uuid");
        assert_eq!(resolved.dependents, vec!["map_uuid_uuid", "uuid", "uuid"]);

        let resolved = registry.resolve("map[Id][]Id").unwrap();
        assert_eq!(resolved.descriptor.name, "map_uuid_Arrayuuid");
    }

    #[test]
    fn test_structure_fields_see_later_registrations() {
        let mut registry = TypeRegistry::new();
        let layout = first_struct("pub struct Book { pub status: Status, pub id: Identifier }");
        registry.define_structure("Book", &layout).unwrap();
        registry
            .define_enum(
                "Status",
                &EnumLayout {
                    name: "Status".into(),
                    variants: vec!["Available".into()],
                },
            )
            .unwrap();
        registry
            .define_primitive("uuid", "string", Facets::default())
            .unwrap();
        registry.define_alias("Identifier", "uuid").unwrap();
        registry.resolve_structures();

        let Some(TypeDefinition::Structure { fields, .. }) = registry.definition("Book") else {
            panic!("Expected a structure");
        };
        let descriptors: Vec<&TypeDescriptor> = fields.iter().map(|f| &f.descriptor).collect();
        assert_eq!(
            descriptors,
            vec![
                &TypeDescriptor::new(TypeKind::Scalar, "Status"),
                &TypeDescriptor::new(TypeKind::Scalar, "uuid"),
            ]
        );
        assert_eq!(registry.dependents_of("Book"), vec!["Status", "uuid"]);
    }

    #[test]
    fn test_define_enum() {
        let mut registry = TypeRegistry::new();
        let layout = EnumLayout {
            name: "Status".into(),
            variants: vec!["Available".into(), "Sold".into()],
        };
        registry.define_enum("Status", &layout).unwrap();
        let resolved = registry.resolve("Status").unwrap();
        assert_eq!(resolved.descriptor.kind, TypeKind::Scalar);
        assert!(registry.dependents_of("Status").is_empty());
    }
}
