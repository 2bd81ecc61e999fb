//! Single-pass text template renderer driven by a JSON-shaped context.
//!
//! ```ignore
//! use scribble_template::render;
//! let out = render("hi @=name=@", serde_json::json!({"name": "Jan"})).unwrap();
//! assert_eq!(out, "hi Jan");
//! ```

mod ast;
mod eval;
mod expr;
mod parser;
mod value;

pub use ast::Node;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use value::Value;

use scribble_base::CompileError;

/// Parses and renders `template` against `context` in one call. For
/// repeated rendering of the same template against different contexts,
/// parse once with [`parse`] and call [`render_parsed`] per context.
pub fn render(template: &str, context: serde_json::Value) -> Result<String, CompileError> {
    let nodes = parser::parse_template(template)?;
    eval::render_nodes(&nodes, Value::from(context))
}

/// Parses a template into its node sequence without rendering it.
pub fn parse(template: &str) -> Result<Vec<Node>, CompileError> {
    parser::parse_template(template)
}

/// Renders a previously-parsed node sequence against `context`.
pub fn render_parsed(nodes: &[Node], context: serde_json::Value) -> Result<String, CompileError> {
    eval::render_nodes(nodes, Value::from(context))
}
