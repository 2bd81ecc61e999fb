//! The two host platforms the backend ever emits for.
//!
//! Grounded on `examples/original_source/scribble/src/arch/arm64/assembly.c`'s
//! `#ifdef IS_APPLE` / `#elif defined(IS_LINUX)` split in
//! `assembly_to_string` and on `spec.md` §4.6's linker-argument table.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Darwin,
    Linux,
}

impl Target {
    /// The target this process is actually running on. The linker driver
    /// defaults to this; tests override it to exercise both branches on a
    /// single host.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "macos" => Target::Darwin,
            _ => Target::Linux,
        }
    }

    /// The section directive that opens a text section on this target.
    pub fn text_section_directive(self) -> &'static str {
        match self {
            Target::Darwin => "__TEXT,__text,regular,pure_instructions",
            Target::Linux => ".text",
        }
    }

    /// The assembler directive name used to select it — Darwin spells the
    /// text-section switch as `.section`, Linux's plain `.text` is its own
    /// directive with no operand.
    pub fn text_section_is_bare_directive(self) -> bool {
        matches!(self, Target::Linux)
    }

    pub fn data_section_directive(self) -> &'static str {
        "__DATA, __data"
    }

    /// Symbol the generated code imports to resolve scribble function
    /// references at link time.
    pub fn runtime_import(self) -> &'static str {
        "_resolve_function"
    }

    pub fn entry_symbol(self) -> &'static str {
        "_start"
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Darwin => write!(f, "darwin"),
            Target::Linux => write!(f, "linux"),
        }
    }
}
