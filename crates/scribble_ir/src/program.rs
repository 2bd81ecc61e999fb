//! The IR's top-level containers: program → modules → functions.
//!
//! Grounded on `spec.md` §3's "IR program" paragraph: "a collection of IR
//! modules; a module is a named collection of IR functions plus
//! static-data entries. An IR function is a linear sequence of IR
//! operations referencing parameters by index and locals by stack slot."

use scribble_ast::TypeId;
use scribble_base::Symbol;

use crate::op::Op;

#[derive(Debug, Clone)]
pub struct StaticData {
    pub name: Symbol,
    pub ty: TypeId,
    pub initial_value: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub parameter_types: Vec<TypeId>,
    /// Every stack slot this function declares, parameters first (by
    /// construction order in `scribble-ast`'s binder) followed by locals.
    pub locals: Vec<TypeId>,
    pub return_type: TypeId,
    pub ops: Vec<Op>,
    /// The scribble entry point: exactly one function across the whole
    /// program may set this, per `spec.md` §4.6's "has main" rule.
    pub is_entry_point: bool,
}

impl Function {
    pub fn new(name: Symbol, parameter_types: Vec<TypeId>, return_type: TypeId) -> Self {
        Function {
            name,
            parameter_types,
            locals: Vec::new(),
            return_type,
            ops: Vec::new(),
            is_entry_point: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: Symbol,
    pub functions: Vec<Function>,
    pub statics: Vec<StaticData>,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub modules: Vec<Module>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// The function with `is_entry_point` set, if exactly one module
    /// declares one. Per `spec.md` §4.6, finding more than one is a
    /// build-time failure left to the code generator to report — this
    /// just returns the first one found, mirroring "first found wins".
    pub fn entry_point(&self) -> Option<&Function> {
        self.modules.iter().flat_map(|m| &m.functions).find(|f| f.is_entry_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_ast::INT_ID;

    #[test]
    fn entry_point_finds_first_marked_function() {
        let mut program = Program::new();
        let mut module = Module { name: Symbol::EMPTY, functions: Vec::new(), statics: Vec::new() };
        let mut main_fn = Function::new(Symbol::EMPTY, vec![], INT_ID);
        main_fn.is_entry_point = true;
        module.functions.push(main_fn);
        program.modules.push(module);
        assert!(program.entry_point().is_some());
    }

    #[test]
    fn entry_point_is_none_when_absent() {
        let program = Program::new();
        assert!(program.entry_point().is_none());
    }
}
