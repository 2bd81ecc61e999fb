#![cfg_attr(docsrs, feature(doc_cfg))]

//! # scribble-base
//!
//! Pure structural atoms for the scribble toolchain.
//!
//! This crate provides the foundational types every other crate in the
//! workspace builds on:
//!
//! - [`Arena`] / [`IdAllocator`] — bump allocation and dense id generation
//!   for stable AST/IR references
//! - [`Interner`] / [`Symbol`] — string interning for O(1) equality
//! - [`Span`] / [`Location`] — source location tracking
//! - [`SpannedError`] / [`BindError`] / [`CompileError`] — errors annotated
//!   with where in the source they occurred
//!
//! # Design Principles
//!
//! This crate has no knowledge of any particular language's grammar and
//! performs no I/O. It is the leaf dependency of the whole pipeline:
//! the lexer, the bound-AST model, the IR generator, and the AArch64
//! backend all sit on top of it, but it depends on nothing else in this
//! workspace.

pub mod arena;
pub mod error;
pub mod intern;
pub mod span;
pub mod text;

pub use arena::{Arena, IdAllocator};
pub use error::{fatal, BindError, BindNote, CompileError, Result, SpannedError};
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::{Location, Span};
