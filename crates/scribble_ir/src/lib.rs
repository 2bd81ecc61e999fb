//! Lowers a bound AST (`scribble-ast`) into a linear, typed intermediate
//! representation: a flat [`Program`] of [`program::Module`]s of
//! [`program::Function`]s of [`op::Op`]s, addressing operands and
//! destinations through the [`location::ValueLocation`] model shared with
//! the AArch64 code generator.
//!
//! Grounded on `spec.md` §3's "IR program" paragraph and §4.5's lowering
//! shape description.

pub mod location;
pub mod lower;
pub mod op;
pub mod program;

pub use location::{Register, ValueLocation, ValueLocationKind};
pub use lower::lower_program;
pub use op::Op;
pub use program::{Function, Module, Program, StaticData};
