//! JSON-RPC 2.0 LSP client glue for the `eddy` editor: a `Content-Length`
//! framed transport ([`transport`]) plus the wire types
//! `scribble-lsp-schema` generates from an embedded TypeScript-schema
//! subset at build time ([`schema`]).

pub mod client;
pub mod transport;

/// Generated at build time by `build.rs` from an embedded schema subset:
/// `Position`, `Range`, `TextDocumentIdentifier`,
/// `VersionedTextDocumentIdentifier`, `TextDocumentItem`,
/// `TextDocumentPositionParams`, `Diagnostic`, `PublishDiagnosticsParams`,
/// `DiagnosticSeverity`, and an `Optional<Name>`/`<Name>List` alias pair
/// per type. Field names mirror the schema's own camelCase, since that's
/// what `scribble-lsp-schema` emits rather than renaming to `snake_case`.
#[allow(non_snake_case)]
pub mod schema {
    include!(concat!(env!("OUT_DIR"), "/schema.rs"));
}

pub use client::LspClient;
