//! The unit of emitted assembly corresponding to one IR module.
//!
//! Grounded on `spec.md` §3's "Assembly model" paragraph and
//! `examples/original_source/scribble/src/arch/arm64/assembly.c`'s
//! `assembly_add_string`/`assembly_add_data`/`assembly_to_string`.

use std::collections::HashMap;

use scribble_base::IdAllocator;

use crate::code::Code;
use crate::target::Target;

/// Whether a generated function originated from scribble source or is a
/// thin native-call stub — mirrors the original's `FK_SCRIBBLE`/`FK_NATIVE`
/// split in `ARM64Function`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Scribble,
    Native,
}

#[derive(Debug, Clone)]
pub struct ArmFunction {
    pub name: String,
    pub kind: FunctionKind,
    pub code: Code,
    pub is_main: bool,
}

impl ArmFunction {
    pub fn new(name: impl Into<String>, kind: FunctionKind) -> Self {
        ArmFunction { name: name.into(), kind, code: Code::new(), is_main: false }
    }
}

/// The AArch64 codegen's per-module output unit: a code section, a data
/// section kept separate until serialisation, the module's functions in
/// declaration order, and an interned string-literal table.
pub struct Assembly {
    pub module_name: String,
    pub target: Target,
    code: Code,
    data: Code,
    functions: Vec<ArmFunction>,
    /// Interned string-literal text → label id. Linear-scan-by-content in
    /// the original; a `HashMap` gives the same "equal content reuses the
    /// label" behaviour with better complexity (see DESIGN.md).
    strings: HashMap<String, u64>,
    has_exports: bool,
    has_main: bool,
    labels: IdAllocator,
}

impl Assembly {
    /// `labels` is shared across every `Assembly` in one compilation so
    /// label ids never collide between modules — `spec.md` §3 pins the
    /// counter's scope as "whole compilation", not per-assembly.
    pub fn new(module_name: impl Into<String>, target: Target, labels: IdAllocator) -> Self {
        Assembly {
            module_name: module_name.into(),
            target,
            code: Code::new(),
            data: Code::new(),
            functions: Vec::new(),
            strings: HashMap::new(),
            has_exports: false,
            has_main: false,
            labels,
        }
    }

    pub fn next_label(&mut self) -> u64 {
        self.labels.next() as u64
    }

    pub fn push_function(&mut self, function: ArmFunction) {
        if function.is_main {
            if self.has_main {
                log::warn!("assembly '{}' already has a main function; keeping the first one found", self.module_name);
            } else {
                self.has_main = true;
            }
        }
        if function.code.has_text() {
            self.has_exports = true;
        }
        self.functions.push(function);
    }

    pub fn function_by_name(&self, name: &str) -> Option<&ArmFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn has_exports(&self) -> bool {
        self.has_exports
    }

    pub fn has_main(&self) -> bool {
        self.has_main
    }

    /// Interns `text`, returning the label id that identifies it in the
    /// data section. A second add of the same text returns the same id
    /// without emitting a second `.asciz` entry (§8 property 6: "the
    /// number of distinct labels equals the number of distinct string
    /// contents").
    pub fn add_string(&mut self, text: &str) -> u64 {
        if let Some(&id) = self.strings.get(text) {
            return id;
        }
        let id = self.next_label();
        self.ensure_data_header();
        self.data.add_directive(".align", Some("2"));
        self.data.add_label(format!("str_{id}"));
        self.data.add_directive(".asciz", Some(&format!("{:?}", text)));
        self.strings.insert(text.to_string(), id);
        id
    }

    pub fn string_label(&self, id: u64) -> String {
        format!("str_{id}")
    }

    fn ensure_data_header(&mut self) {
        if self.data.is_empty() {
            self.data.select_prologue();
            self.data.add_directive(".section", Some(self.target.data_section_directive()));
            self.data.select_code();
        }
    }

    /// Reserves a data-section entry: a label, optional `.global`,
    /// 8-byte alignment, and a type directive (`.quad`, `.asciz`, ...)
    /// with `value`. `is_static` appends a trailing zero short, matching
    /// `assembly_add_data`'s padding for statically-sized scalars.
    pub fn add_data(&mut self, label: &str, global: bool, type_directive: &str, value: &str, is_static: bool) {
        self.ensure_data_header();
        if global {
            self.data.add_directive(".global", Some(label));
        }
        self.data.add_directive(".align", Some("8"));
        self.data.add_label(label);
        self.data.add_directive(type_directive, Some(value));
        if is_static {
            self.data.add_directive(".short", Some("0"));
        }
        self.has_exports = true;
    }

    pub fn code_mut(&mut self) -> &mut Code {
        &mut self.code
    }

    /// Serialises the whole assembly to its final text form, or `None` if
    /// it has no exported symbols (matching `assembly_to_string`'s "no
    /// prologue at all when empty" rule, §3's Assembly-model invariant).
    pub fn to_text(&mut self) -> Option<String> {
        self.code.select_prologue();
        if self.target.text_section_is_bare_directive() {
            self.code.add_directive(self.target.text_section_directive(), None);
        } else {
            self.code.add_directive(".section", Some(self.target.text_section_directive()));
        }
        self.code.add_directive(".align", Some("2"));
        self.code.add_import(self.target.runtime_import());

        self.code.select_code();
        for function in &self.functions {
            if function.code.has_text() {
                self.code.append_code(&function.code);
            }
        }

        if self.code.is_empty() {
            self.has_exports = false;
            return None;
        }

        self.code.select_epilogue();
        let data = self.data.clone();
        self.code.append_code(&data);
        Some(self.code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembly() -> Assembly {
        Assembly::new("main_module", Target::Linux, IdAllocator::starting_at(5000))
    }

    #[test]
    fn repeated_string_add_returns_same_label() {
        let mut asm = assembly();
        let a = asm.add_string("hi");
        let b = asm.add_string("hi");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_get_distinct_labels() {
        let mut asm = assembly();
        let a = asm.add_string("hi");
        let b = asm.add_string("bye");
        assert_ne!(a, b);
    }

    #[test]
    fn label_ids_start_at_the_shared_counter() {
        let mut asm = assembly();
        assert_eq!(asm.add_string("x"), 5000);
    }

    #[test]
    fn empty_assembly_has_no_exports_and_serializes_to_none() {
        let mut asm = assembly();
        assert!(!asm.has_exports());
        assert!(asm.to_text().is_none());
    }

    #[test]
    fn assembly_with_function_text_has_exports() {
        let mut asm = assembly();
        let mut func = ArmFunction::new("main", FunctionKind::Scribble);
        func.code.add_line("mov w0, #0");
        func.is_main = true;
        asm.push_function(func);
        assert!(asm.has_exports());
        assert!(asm.has_main());
        let text = asm.to_text().expect("non-empty assembly serializes");
        assert!(text.contains("mov w0, #0"));
        assert!(text.contains(".text"));
    }

    #[test]
    fn second_main_function_is_ignored_in_favour_of_the_first() {
        let mut asm = assembly();
        let mut a = ArmFunction::new("a", FunctionKind::Scribble);
        a.code.add_line("nop");
        a.is_main = true;
        let mut b = ArmFunction::new("b", FunctionKind::Scribble);
        b.code.add_line("nop");
        b.is_main = true;
        asm.push_function(a);
        asm.push_function(b);
        assert!(asm.has_main());
        assert_eq!(asm.function_by_name("a").unwrap().name, "a");
    }
}
