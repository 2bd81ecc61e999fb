//! Renders a resolved [`Module`] to Rust source: a storage type per typedef,
//! hand-written `TryFrom<&serde_json::Value>`/`encode` pairs (the decode
//! contract is "empty optional on any mismatch", which a derived
//! `serde::Deserialize` can't express), and an `Optional`/list wrapper pair
//! per named type.
//!
//! The repetitive per-property assembly goes through `scribble_template`
//! rather than `format!` joins: each struct/enum gets a small JSON
//! projection (`{"properties": [...]}` or `{"values": [...]}`) and the
//! surrounding scaffolding is plain Rust source built around the rendered
//! fragments.

use scribble_base::CompileError;

use crate::model::{BasicType, ConstantValue, Enumeration, Interface, Module, Property, Type, TypeDef, TypeDefPayload, TypeKind};

const FIELDS_TEMPLATE: &str = r#"@%for idx, prop in properties@%    pub @=prop.field=@: @=prop.rust_type=@,
@%;"#;

const DECODE_TEMPLATE: &str = r#"@%for idx, prop in properties@%        let @=prop.field=@ = @%if prop.optional@%value.get("@=prop.json_name=@").and_then(|v| @=prop.decode_expr=@)@%else@%match value.get("@=prop.json_name=@").and_then(|v| @=prop.decode_expr=@) { Some(x) => x, None => return Err(()) }@%;;
@%;"#;

const ENCODE_TEMPLATE: &str = r#"@%for idx, prop in properties@%@%if prop.optional@%        if let Some(v) = &self.@=prop.field=@ { fields.push(("@=prop.json_name=@".to_string(), @=prop.encode_expr=@)); }
@%else@%        { let v = &self.@=prop.field=@; fields.push(("@=prop.json_name=@".to_string(), @=prop.encode_expr=@)); }
@%;
@%;"#;

const CONSTRUCT_TEMPLATE: &str = r#"@%for idx, prop in properties@%            @=prop.field=@,
@%;"#;

const ENUM_VARIANTS_TEMPLATE: &str = r#"@%for idx, v in values@%    @=v.variant=@,
@%;"#;

const ENUM_ENCODE_TEMPLATE: &str = r#"@%for idx, v in values@%            @=name=@::@=v.variant=@ => @=v.encode_expr=@,
@%;"#;

const ENUM_DECODE_TEMPLATE: &str = r#"@%for idx, v in values@%            Some(@=v.literal=@) => Ok(@=name=@::@=v.variant=@),
@%;"#;

const UNION_ENCODE_TEMPLATE: &str = r#"@%for idx, v in variants@%            @=name=@::@=v.variant=@(v) => @=v.encode_expr=@,
@%;"#;

/// Rust reserved identifiers this schema's property names are known to hit
/// (`type`, `enum`, `ref`); raw-identifier-escaped rather than renamed so
/// the JSON key stays recognisable next to the field.
const RUST_KEYWORDS: &[&str] = &[
    "type", "enum", "ref", "impl", "trait", "override", "const", "use", "as", "in", "for", "if", "else", "fn", "match", "move",
    "return", "self", "Self", "static", "struct", "super", "where", "while", "dyn", "mod", "pub", "let", "loop", "box", "yield",
    "final", "async", "await", "abstract", "virtual", "unsafe", "true", "false",
];

fn field_ident(name: &str) -> String {
    let sanitized: String = name.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
    if RUST_KEYWORDS.contains(&sanitized.as_str()) {
        format!("r#{sanitized}")
    } else {
        sanitized
    }
}

/// Renders every typedef in `module.order`, followed by an `Optional`/list
/// wrapper pair for each. Emitting in `order` guarantees a generated type
/// never references a Rust name the generator hasn't emitted yet.
pub fn generate_module(module: &Module) -> Result<String, CompileError> {
    let mut out = String::new();
    out.push_str("#![allow(dead_code, clippy::all)]\n\n");
    for name in &module.order {
        let typedef = module.find(name).expect("order only lists known typedefs");
        out.push_str(&generate_typedef(typedef, module)?);
        out.push('\n');
    }
    for name in &module.order {
        out.push_str(&format!("pub type Optional{name} = Option<{name}>;\n"));
        out.push_str(&format!("pub type {name}List = Vec<{name}>;\n"));
    }
    Ok(out)
}

fn generate_typedef(typedef: &TypeDef, module: &Module) -> Result<String, CompileError> {
    match &typedef.payload {
        TypeDefPayload::Interface(iface) => generate_interface(&typedef.name, iface, module),
        TypeDefPayload::Enumeration(en) => generate_enumeration(&typedef.name, en),
        TypeDefPayload::Alias(ty) => generate_alias(&typedef.name, ty, module),
    }
}

fn generate_alias(name: &str, ty: &Type, module: &Module) -> Result<String, CompileError> {
    match &ty.kind {
        TypeKind::AnonymousStruct(props) if !ty.array => {
            generate_interface(name, &Interface { extends: Vec::new(), properties: props.clone() }, module)
        }
        TypeKind::AnonymousVariant(members) if !ty.array => generate_union(name, members),
        _ => Ok(format!("pub type {name} = {};\n", rust_type_of(ty))),
    }
}

fn rust_type_of(ty: &Type) -> String {
    let base = match &ty.kind {
        TypeKind::Basic(b) => b.rust_type().to_string(),
        TypeKind::Named(n) => n.clone(),
        TypeKind::Constant(ConstantValue::Str(_)) => "String".to_string(),
        TypeKind::Constant(ConstantValue::Int(_)) => "i64".to_string(),
        TypeKind::AnonymousStruct(_) | TypeKind::AnonymousVariant(_) => "serde_json::Value".to_string(),
    };
    if ty.array {
        format!("Vec<{base}>")
    } else {
        base
    }
}

/// A scalar (non-array) decode expression reading `var: &serde_json::Value`
/// into `Option<RustType>`.
fn decode_scalar_expr(ty: &Type, var: &str) -> String {
    match &ty.kind {
        TypeKind::Basic(BasicType::Boolean) => format!("{var}.as_bool()"),
        TypeKind::Basic(BasicType::Integer) => format!("{var}.as_i64().map(|n| n as i32)"),
        TypeKind::Basic(BasicType::UInteger) => format!("{var}.as_u64().map(|n| n as u32)"),
        TypeKind::Basic(BasicType::Decimal) => format!("{var}.as_f64()"),
        TypeKind::Basic(BasicType::String) => format!("{var}.as_str().map(|s| s.to_string())"),
        TypeKind::Basic(BasicType::LspAny) => format!("Some({var}.clone())"),
        TypeKind::Basic(BasicType::Null) => format!("if {var}.is_null() {{ Some(()) }} else {{ None }}"),
        TypeKind::Named(n) => format!("{n}::try_from({var}).ok()"),
        TypeKind::Constant(ConstantValue::Str(s)) => {
            format!("if {var}.as_str() == Some({s:?}) {{ Some({s:?}.to_string()) }} else {{ None }}")
        }
        TypeKind::Constant(ConstantValue::Int(n)) => {
            format!("if {var}.as_i64() == Some({n}) {{ Some({n}) }} else {{ None }}")
        }
        TypeKind::AnonymousStruct(_) | TypeKind::AnonymousVariant(_) => format!("Some({var}.clone())"),
    }
}

fn decode_expr(ty: &Type, var: &str) -> String {
    if ty.array {
        let elem = Type { kind: ty.kind.clone(), array: false };
        let elem_expr = decode_scalar_expr(&elem, "e");
        format!("{var}.as_array().map(|arr| arr.iter().filter_map(|e| {elem_expr}).collect::<Vec<_>>())")
    } else {
        decode_scalar_expr(ty, var)
    }
}

/// A scalar encode expression turning `var: &RustType` into a
/// `serde_json::Value`.
fn encode_scalar_expr(ty: &Type, var: &str) -> String {
    match &ty.kind {
        TypeKind::Basic(BasicType::Boolean) => format!("serde_json::Value::Bool(*{var})"),
        TypeKind::Basic(BasicType::Integer | BasicType::UInteger | BasicType::Decimal) => format!("serde_json::json!(*{var})"),
        TypeKind::Basic(BasicType::String) => format!("serde_json::Value::String({var}.clone())"),
        TypeKind::Basic(BasicType::LspAny) => format!("{var}.clone()"),
        TypeKind::Basic(BasicType::Null) => "serde_json::Value::Null".to_string(),
        TypeKind::Named(_) => format!("{var}.encode()"),
        TypeKind::Constant(ConstantValue::Str(s)) => format!("serde_json::Value::String({s:?}.to_string())"),
        TypeKind::Constant(ConstantValue::Int(n)) => format!("serde_json::json!({n})"),
        TypeKind::AnonymousStruct(_) | TypeKind::AnonymousVariant(_) => format!("{var}.clone()"),
    }
}

fn encode_expr(ty: &Type, var: &str) -> String {
    if ty.array {
        let elem = Type { kind: ty.kind.clone(), array: false };
        let elem_expr = encode_scalar_expr(&elem, "e");
        format!("serde_json::Value::Array({var}.iter().map(|e| {elem_expr}).collect())")
    } else {
        encode_scalar_expr(ty, var)
    }
}

/// `extends` flattened: base properties first (recursively), then this
/// interface's own properties, with a same-named own property overriding
/// whatever it inherited.
fn all_properties<'m>(iface: &'m Interface, module: &'m Module) -> Vec<&'m Property> {
    let mut result: Vec<&Property> = Vec::new();
    for base_name in &iface.extends {
        if let Some(TypeDef { payload: TypeDefPayload::Interface(base_iface), .. }) = module.find(base_name) {
            for p in all_properties(base_iface, module) {
                if !result.iter().any(|r| r.name == p.name) {
                    result.push(p);
                }
            }
        }
    }
    for p in &iface.properties {
        result.retain(|r| r.name != p.name);
        result.push(p);
    }
    result
}

fn property_context(prop: &Property) -> serde_json::Value {
    let field = field_ident(&prop.name);
    let rust_type = if prop.optional { format!("Option<{}>", rust_type_of(&prop.ty)) } else { rust_type_of(&prop.ty) };
    serde_json::json!({
        "field": field,
        "json_name": prop.name,
        "optional": prop.optional,
        "rust_type": rust_type,
        "decode_expr": decode_expr(&prop.ty, "v"),
        "encode_expr": encode_expr(&prop.ty, "v"),
    })
}

fn generate_interface(name: &str, iface: &Interface, module: &Module) -> Result<String, CompileError> {
    let props = all_properties(iface, module);
    let ctx = serde_json::json!({ "properties": props.iter().map(|p| property_context(p)).collect::<Vec<_>>() });

    let fields = scribble_template::render(FIELDS_TEMPLATE, ctx.clone())?;
    let decode = scribble_template::render(DECODE_TEMPLATE, ctx.clone())?;
    let construct = scribble_template::render(CONSTRUCT_TEMPLATE, ctx.clone())?;
    let encode = scribble_template::render(ENCODE_TEMPLATE, ctx)?;

    Ok(format!(
        "#[derive(Debug, Clone, PartialEq)]\npub struct {name} {{\n{fields}}}\n\n\
         impl {name} {{\n    pub fn encode(&self) -> serde_json::Value {{\n        let mut fields: Vec<(String, serde_json::Value)> = Vec::new();\n{encode}        serde_json::Value::Object(fields.into_iter().collect())\n    }}\n}}\n\n\
         impl TryFrom<&serde_json::Value> for {name} {{\n    type Error = ();\n\n    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {{\n        if !value.is_object() {{ return Err(()); }}\n{decode}        Ok({name} {{\n{construct}        }})\n    }}\n}}\n",
    ))
}

fn enum_value_context(name: &str, value: &ConstantValue) -> serde_json::Value {
    let (encode_expr, literal) = match value {
        ConstantValue::Str(s) => (format!("serde_json::Value::String({s:?}.to_string())"), format!("{s:?}")),
        ConstantValue::Int(n) => (format!("serde_json::json!({n})"), n.to_string()),
    };
    serde_json::json!({ "variant": name, "encode_expr": encode_expr, "literal": literal })
}

fn generate_enumeration(name: &str, en: &Enumeration) -> Result<String, CompileError> {
    let values: Vec<serde_json::Value> = en.values.iter().map(|(n, v)| enum_value_context(n, v)).collect();
    let variants_ctx = serde_json::json!({ "values": values.clone() });
    let encode_ctx = serde_json::json!({ "name": name, "values": values.clone() });
    let decode_ctx = serde_json::json!({ "name": name, "values": values });

    let variants = scribble_template::render(ENUM_VARIANTS_TEMPLATE, variants_ctx)?;
    let encode = scribble_template::render(ENUM_ENCODE_TEMPLATE, encode_ctx)?;
    let decode = scribble_template::render(ENUM_DECODE_TEMPLATE, decode_ctx)?;

    // `as_str()` (not `.map(|s| s.to_string())`) so each arm can match
    // against a string-literal pattern: `String` has no literal pattern,
    // only `&str` does.
    let probe = match en.underlying {
        BasicType::String => "value.as_str()",
        _ => "value.as_i64()",
    };

    Ok(format!(
        "#[derive(Debug, Clone, Copy, PartialEq, Eq)]\npub enum {name} {{\n{variants}}}\n\n\
         impl {name} {{\n    pub fn encode(&self) -> serde_json::Value {{\n        match self {{\n{encode}        }}\n    }}\n}}\n\n\
         impl TryFrom<&serde_json::Value> for {name} {{\n    type Error = ();\n\n    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {{\n        match {probe} {{\n{decode}            _ => Err(()),\n        }}\n    }}\n}}\n",
    ))
}

fn generate_union(name: &str, members: &[Type]) -> Result<String, CompileError> {
    let variants: Vec<serde_json::Value> = members
        .iter()
        .enumerate()
        .map(|(idx, ty)| {
            serde_json::json!({
                "variant": format!("Member{idx}"),
                "rust_type": rust_type_of(ty),
                "encode_expr": encode_expr(ty, "v"),
            })
        })
        .collect();

    let mut variant_decls = String::new();
    for v in &variants {
        variant_decls.push_str(&format!("    {}({}),\n", v["variant"].as_str().unwrap(), v["rust_type"].as_str().unwrap()));
    }

    let encode_ctx = serde_json::json!({ "name": name, "variants": variants.clone() });
    let encode = scribble_template::render(UNION_ENCODE_TEMPLATE, encode_ctx)?;

    let mut decode = String::new();
    for (idx, ty) in members.iter().enumerate() {
        let expr = decode_expr(ty, "value");
        decode.push_str(&format!("        if let Some(v) = {expr} {{ return Ok({name}::Member{idx}(v)); }}\n"));
    }

    Ok(format!(
        "#[derive(Debug, Clone, PartialEq)]\npub enum {name} {{\n{variant_decls}}}\n\n\
         impl {name} {{\n    pub fn encode(&self) -> serde_json::Value {{\n        match self {{\n{encode}        }}\n    }}\n}}\n\n\
         impl TryFrom<&serde_json::Value> for {name} {{\n    type Error = ();\n\n    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {{\n{decode}        Err(())\n    }}\n}}\n",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Enumeration, Interface, Property, Type, TypeDef, TypeDefPayload};

    fn module_with(typedefs: Vec<TypeDef>, order: Vec<&str>) -> Module {
        Module { name: "test".to_string(), typedefs, order: order.into_iter().map(String::from).collect() }
    }

    #[test]
    fn generates_struct_with_required_and_optional_fields() {
        let iface = Interface {
            extends: Vec::new(),
            properties: vec![
                Property { name: "uri".to_string(), optional: false, ty: Type::basic(BasicType::String) },
                Property { name: "version".to_string(), optional: true, ty: Type::basic(BasicType::Integer) },
            ],
        };
        let def = TypeDef { name: "Doc".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Interface(iface) };
        let module = module_with(vec![def], vec!["Doc"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub struct Doc"));
        assert!(code.contains("pub uri: String"));
        assert!(code.contains("pub version: Option<i32>"));
        assert!(code.contains("impl TryFrom<&serde_json::Value> for Doc"));
        assert!(code.contains("pub type OptionalDoc = Option<Doc>;"));
        assert!(code.contains("pub type DocList = Vec<Doc>;"));
    }

    #[test]
    fn reserved_word_field_becomes_a_raw_identifier() {
        let iface = Interface {
            extends: Vec::new(),
            properties: vec![Property { name: "type".to_string(), optional: false, ty: Type::basic(BasicType::String) }],
        };
        let def = TypeDef { name: "Tagged".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Interface(iface) };
        let module = module_with(vec![def], vec!["Tagged"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub r#type: String"));
        assert!(code.contains("\"type\""));
    }

    #[test]
    fn extends_flattens_base_properties() {
        let base = Interface {
            extends: Vec::new(),
            properties: vec![Property { name: "id".to_string(), optional: false, ty: Type::basic(BasicType::Integer) }],
        };
        let derived = Interface {
            extends: vec!["Base".to_string()],
            properties: vec![Property { name: "name".to_string(), optional: false, ty: Type::basic(BasicType::String) }],
        };
        let base_def = TypeDef { name: "Base".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Interface(base) };
        let derived_def = TypeDef { name: "Derived".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Interface(derived) };
        let module = module_with(vec![base_def, derived_def], vec!["Base", "Derived"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub struct Derived"));
        assert!(code.contains("pub id: i32"));
        assert!(code.contains("pub name: String"));
    }

    #[test]
    fn generates_enumeration_with_encode_and_decode() {
        let en = Enumeration {
            underlying: BasicType::Integer,
            values: vec![("Error".to_string(), ConstantValue::Int(1)), ("Warning".to_string(), ConstantValue::Int(2))],
        };
        let def = TypeDef { name: "Severity".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Enumeration(en) };
        let module = module_with(vec![def], vec!["Severity"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub enum Severity"));
        assert!(code.contains("Error,"));
        assert!(code.contains("Some(1) => Ok(Severity::Error)"));
    }

    #[test]
    fn generates_union_alias_as_tagged_enum() {
        let alias = TypeDefPayload::Alias(Type {
            kind: TypeKind::AnonymousVariant(vec![Type::basic(BasicType::String), Type::basic(BasicType::Integer)]),
            array: false,
        });
        let def = TypeDef { name: "IdLike".to_string(), dependencies: Vec::new(), payload: alias };
        let module = module_with(vec![def], vec!["IdLike"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub enum IdLike"));
        assert!(code.contains("Member0(String)"));
        assert!(code.contains("Member1(i32)"));
    }

    #[test]
    fn simple_alias_becomes_a_type_alias() {
        let def = TypeDef { name: "DocumentUri".to_string(), dependencies: Vec::new(), payload: TypeDefPayload::Alias(Type::basic(BasicType::String)) };
        let module = module_with(vec![def], vec!["DocumentUri"]);
        let code = generate_module(&module).unwrap();
        assert!(code.contains("pub type DocumentUri = String;"));
    }
}
