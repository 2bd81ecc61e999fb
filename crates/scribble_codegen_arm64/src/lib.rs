//! Emits AArch64 assembly from `scribble-ir` programs and drives the
//! system assembler and linker to produce (and optionally run) a binary.
//!
//! Grounded on `spec.md` §4.6's AArch64 backend description and
//! `examples/original_source/scribble/src/arch/arm64/`'s `assembly.c`/
//! `arm64.c` split between assembly-model bookkeeping and codegen proper.

pub mod assembly;
pub mod code;
pub mod emit;
pub mod link;
pub mod opcodes;
pub mod target;

pub use assembly::{ArmFunction, Assembly, FunctionKind};
pub use code::{Code, CodeSelector};
pub use emit::emit_function;
pub use link::{assemble, execute, link as link_objects, LinkOptions, BUILD_DIR};
pub use opcodes::{size_ops, RegWidth, SizeOps};
pub use target::Target;

use scribble_ast::TypeRegistry;
use scribble_base::{IdAllocator, Interner};
use scribble_ir::Program;

/// Lowers every module of `program` into its own [`Assembly`], sharing one
/// label-id counter across the whole compilation (`spec.md` §3: label ids
/// are unique per compilation, not per module).
pub fn emit_program(program: &Program, types: &TypeRegistry, interner: &Interner, target: Target) -> Vec<Assembly> {
    let labels = IdAllocator::starting_at(5000);
    let mut assemblies = Vec::with_capacity(program.modules.len());
    for module in &program.modules {
        let mut assembly = Assembly::new(interner.resolve(module.name).to_string(), target, labels.clone());
        for function in &module.functions {
            let arm_fn = emit_function(function, &mut assembly, types, interner);
            assembly.push_function(arm_fn);
        }
        assemblies.push(assembly);
    }
    assemblies
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_ast::{bind_program, Literal, SyntaxArena, SyntaxKind};
    use scribble_base::Location;
    use scribble_ir::lower_program;

    #[test]
    fn emit_program_produces_one_assembly_per_module_with_main_flagged() {
        let mut syntax = SyntaxArena::new();
        let mut interner = Interner::new();
        let loc = Location::start_of("test.scribble");
        let int_name = interner.intern("int");
        let main_name = interner.intern("main");
        let type_ref = syntax.push(SyntaxKind::TypeRef { name: int_name, array: false }, loc.clone(), None);
        let zero = syntax.push(SyntaxKind::Lit(Literal::Integer(0)), loc.clone(), None);
        let ret = syntax.push(SyntaxKind::Return { expr: Some(zero) }, loc.clone(), None);
        let block = syntax.push(SyntaxKind::Block { statements: vec![ret] }, loc.clone(), None);
        let func = syntax.push(
            SyntaxKind::Function { name: main_name, parameters: vec![], return_type: type_ref, implementation: Some(block) },
            loc.clone(),
            None,
        );
        let module_name = interner.intern("main_module");
        let module = syntax.push(SyntaxKind::Module { name: module_name, imports: vec![], types: vec![], functions: vec![func] }, loc.clone(), None);
        let root = syntax.push(SyntaxKind::Program { modules: vec![module] }, loc, None);

        let mut types = TypeRegistry::new(&mut interner);
        let (bound, bound_root) = bind_program(&syntax, root, &mut types, &interner).expect("binds cleanly");
        let program = lower_program(&bound, bound_root, Some("main"), &mut interner);

        let mut assemblies = emit_program(&program, &types, &interner, Target::Linux);
        assert_eq!(assemblies.len(), 1);
        assert!(assemblies[0].has_main());
        assert!(assemblies[0].to_text().is_some());
    }
}
