//! Generates the LSP wire types `eddy_lsp_client::schema` re-exports, by
//! running the embedded TypeScript-schema subset below through
//! `scribble-lsp-schema`'s translator at build time rather than committing
//! hand-written bindings that could drift from the generator.

use std::env;
use std::fs;
use std::path::Path;

const SCHEMA_SOURCE: &str = r#"
export interface Position {
    line: uinteger;
    character: uinteger;
}

export interface Range {
    start: Position;
    end: Position;
}

export interface TextDocumentIdentifier {
    uri: string;
}

export interface VersionedTextDocumentIdentifier extends TextDocumentIdentifier {
    version: integer;
}

export interface TextDocumentItem {
    uri: string;
    languageId: string;
    version: integer;
    text: string;
}

export interface TextDocumentPositionParams {
    textDocument: TextDocumentIdentifier;
    position: Position;
}

export interface Diagnostic {
    range: Range;
    message: string;
    severity?: integer;
}

export interface PublishDiagnosticsParams {
    uri: string;
    diagnostics: Diagnostic[];
}

export namespace DiagnosticSeverity {
    export const Error: integer = 1;
    export const Warning: integer = 2;
    export const Information: integer = 3;
    export const Hint: integer = 4;
}
"#;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR");
    let generated = scribble_lsp_schema::generate("lsp.ts", SCHEMA_SOURCE, "lsp")
        .expect("the embedded LSP schema subset translates cleanly");
    fs::write(Path::new(&out_dir).join("schema.rs"), generated).expect("write generated LSP schema module");
    println!("cargo:rerun-if-changed=build.rs");
}
