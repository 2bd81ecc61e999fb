//! Child-process spawning with condition-variable-synchronised pipes.
//!
//! Used by the AArch64 backend's execute stage (`scribble-codegen-arm64`'s
//! `link` module) to run a freshly assembled-and-linked binary while
//! streaming its stdout/stderr back to the frontend without blocking on a
//! full-program read.

pub mod pipe;
pub mod process;

pub use pipe::{ReadPipe, WritePipe};
pub use process::ManagedProcess;
