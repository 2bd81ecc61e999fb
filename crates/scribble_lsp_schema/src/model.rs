//! The data model §3 of the specification pins down for a parsed LSP
//! schema: `TypeDef`, `Interface`, `Property`, `Type`, `Enumeration`,
//! `Module`.

/// A TypeScript basic type this translator understands natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Boolean,
    Integer,
    UInteger,
    Decimal,
    String,
    LspAny,
    Null,
}

impl BasicType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "boolean" => BasicType::Boolean,
            "integer" => BasicType::Integer,
            "uinteger" => BasicType::UInteger,
            "decimal" => BasicType::Decimal,
            "string" => BasicType::String,
            "LSPAny" => BasicType::LspAny,
            "null" => BasicType::Null,
            _ => return None,
        })
    }

    /// The Rust type this basic type materialises as in generated code.
    pub fn rust_type(self) -> &'static str {
        match self {
            BasicType::Boolean => "bool",
            BasicType::Integer => "i32",
            BasicType::UInteger => "u32",
            BasicType::Decimal => "f64",
            BasicType::String => "String",
            BasicType::LspAny => "serde_json::Value",
            BasicType::Null => "()",
        }
    }
}

/// A string- or number-literal type (`"foo"`, `1`), used for discriminant
/// fields and enum values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Str(String),
    Int(i64),
}

/// The kind-specific payload of a [`Type`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Basic(BasicType),
    Constant(ConstantValue),
    /// A reference to another typedef by name.
    Named(String),
    /// `A | B | C` — a tagged union tried in declaration order at decode.
    AnonymousVariant(Vec<Type>),
    /// `{ a: T; b: U }` materialised inline, scoped to its enclosing typedef.
    AnonymousStruct(Vec<Property>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub array: bool,
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type { kind: TypeKind::Named(name.into()), array: false }
    }

    pub fn basic(basic: BasicType) -> Self {
        Type { kind: TypeKind::Basic(basic), array: false }
    }

    /// Every user-type name this type directly references — used to build
    /// a typedef's dependency list before transitive closure.
    pub fn referenced_names(&self) -> Vec<String> {
        match &self.kind {
            TypeKind::Named(name) => vec![name.clone()],
            TypeKind::AnonymousVariant(types) => types.iter().flat_map(Type::referenced_names).collect(),
            TypeKind::AnonymousStruct(props) => props.iter().flat_map(|p| p.ty.referenced_names()).collect(),
            TypeKind::Basic(_) | TypeKind::Constant(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub optional: bool,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub extends: Vec<String>,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration {
    pub underlying: BasicType,
    /// Declaration-ordered `(name, value)` pairs.
    pub values: Vec<(String, ConstantValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefPayload {
    Alias(Type),
    Interface(Interface),
    Enumeration(Enumeration),
}

/// A single named type found in a schema source file.
///
/// `dependencies` starts as the type's *direct* references at parse time;
/// [`crate::resolve::resolve_module`] rewrites it in place to the
/// transitive closure, per §3's invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub dependencies: Vec<String>,
    pub payload: TypeDefPayload,
}

impl TypeDef {
    /// This typedef's direct references, recomputed from its payload
    /// (used to seed `dependencies` before closure).
    pub fn direct_references(&self) -> Vec<String> {
        match &self.payload {
            TypeDefPayload::Alias(ty) => ty.referenced_names(),
            TypeDefPayload::Interface(iface) => {
                let mut names = iface.extends.clone();
                names.extend(iface.properties.iter().flat_map(|p| p.ty.referenced_names()));
                names
            }
            TypeDefPayload::Enumeration(_) => Vec::new(),
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self.payload, TypeDefPayload::Alias(_))
    }
}

/// A parsed schema source file: its typedefs in declaration order, plus
/// (after resolution) a topologically-sorted name ordering.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub typedefs: Vec<TypeDef>,
    /// Populated by [`crate::resolve::resolve_module`]: dependants follow
    /// dependencies.
    pub order: Vec<String>,
}

impl Module {
    pub fn find(&self, name: &str) -> Option<&TypeDef> {
        self.typedefs.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_type_from_keyword_recognises_all_ts_lib_types() {
        for word in ["boolean", "integer", "uinteger", "decimal", "string", "LSPAny", "null"] {
            assert!(BasicType::from_keyword(word).is_some(), "{word} should resolve");
        }
        assert!(BasicType::from_keyword("number").is_none());
    }

    #[test]
    fn referenced_names_collects_from_anonymous_variant() {
        let ty = Type { kind: TypeKind::AnonymousVariant(vec![Type::named("A"), Type::named("B")]), array: false };
        assert_eq!(ty.referenced_names(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn direct_references_include_extends_and_property_types() {
        let iface = Interface {
            extends: vec!["Base".to_string()],
            properties: vec![Property { name: "other".to_string(), optional: false, ty: Type::named("Other") }],
        };
        let def = TypeDef { name: "Foo".to_string(), dependencies: vec![], payload: TypeDefPayload::Interface(iface) };
        let refs = def.direct_references();
        assert!(refs.contains(&"Base".to_string()));
        assert!(refs.contains(&"Other".to_string()));
    }
}
