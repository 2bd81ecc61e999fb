//! Parses the TypeScript subset the Language Server Protocol's own type
//! definitions are written in and emits Rust source: a storage struct or
//! enum per named type, hand-written JSON decode/encode, and an
//! `Optional`/list wrapper pair per type.
//!
//! ```ignore
//! let rust_source = scribble_lsp_schema::generate("lsp.ts", source_text, "lsp")?;
//! ```

pub mod codegen;
pub mod language;
pub mod model;
pub mod parser;
pub mod resolve;

pub use model::{BasicType, ConstantValue, Enumeration, Interface, Module, Property, Type, TypeDef, TypeDefPayload, TypeKind};

use scribble_base::CompileError;

/// Parses `source`, resolves its dependency closure, and renders the result
/// straight to Rust source text — the single entry point a build step
/// wired up against this crate calls.
pub fn generate(file_name: &str, source: &str, module_name: impl Into<String>) -> Result<String, CompileError> {
    let module = parse_schema(file_name, source, module_name)?;
    codegen::generate_module(&module)
}

/// Parses and resolves `source` without rendering, for callers that want to
/// inspect the typedef model (e.g. to merge several schema files into one
/// `Module` before generating).
pub fn parse_schema(file_name: &str, source: &str, module_name: impl Into<String>) -> Result<Module, CompileError> {
    let mut module = parser::parse_module(source, file_name, module_name)?;
    resolve::resolve_module(&mut module)?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_rust_source_for_a_small_schema() {
        let source = r#"
            export interface TextDocumentIdentifier {
                uri: string;
            }

            export interface VersionedTextDocumentIdentifier extends TextDocumentIdentifier {
                version: integer;
            }
        "#;
        let code = generate("schema.ts", source, "lsp").unwrap();
        assert!(code.contains("pub struct TextDocumentIdentifier"));
        assert!(code.contains("pub struct VersionedTextDocumentIdentifier"));
        assert!(code.contains("pub uri: String"));
        assert!(code.contains("pub version: i32"));
        assert!(code.contains("pub type OptionalVersionedTextDocumentIdentifier"));
    }

    #[test]
    fn decode_is_grounded_in_try_from_not_serde_derive() {
        let source = "export interface Foo { a: string; b?: integer; }";
        let code = generate("schema.ts", source, "lsp").unwrap();
        assert!(code.contains("impl TryFrom<&serde_json::Value> for Foo"));
        assert!(!code.contains("derive(Deserialize"));
    }

    #[test]
    fn namespace_enumeration_round_trips_through_codegen() {
        let source = r#"
            export namespace DiagnosticSeverity {
                export const Error: integer = 1;
                export const Warning: integer = 2;
            }
        "#;
        let code = generate("schema.ts", source, "lsp").unwrap();
        assert!(code.contains("pub enum DiagnosticSeverity"));
        assert!(code.contains("Error,"));
        assert!(code.contains("Some(1) => Ok(DiagnosticSeverity::Error)"));
    }

    #[test]
    fn undefined_reference_fails_generation() {
        let source = "export interface Foo { bar: Missing; }";
        assert!(generate("schema.ts", source, "lsp").is_err());
    }
}
