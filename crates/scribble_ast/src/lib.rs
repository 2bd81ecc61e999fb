#![cfg_attr(docsrs, feature(doc_cfg))]

//! # scribble-ast
//!
//! The unbound syntax tree, the bound (typed) tree, the type registry, and
//! the binder that turns one into the other.
//!
//! Parsing produces a [`SyntaxArena`] of [`SyntaxKind`] nodes addressed by
//! [`NodeId`]. [`binder::bind_program`] walks that tree against lexical
//! scope, resolving every name and assigning every expression a [`TypeId`],
//! producing a [`BoundArena`] of [`BoundKind`] nodes addressed by
//! [`BoundId`]. Binding is fallible and accumulates every [`scribble_base::BindError`]
//! it finds rather than stopping at the first one.

pub mod binder;
pub mod bound;
pub mod language;
pub mod parser;
pub mod syntax;
pub mod types;

pub use binder::bind_program;
pub use bound::{BoundArena, BoundId, BoundKind, BoundNode};
pub use parser::parse_program;
pub use syntax::{Literal, NodeId, Operator, SyntaxArena, SyntaxKind, SyntaxNode};
pub use types::{TypeDescriptor, TypeId, TypeKind, TypeRegistry, BOOL_ID, DECIMAL_ID, INT_ID, STRING_ID};
