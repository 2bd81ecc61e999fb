//! The pure lex→parse→bind→IR→codegen→link pipeline, with no IPC or
//! process-spawning of its own: [`Frontend`](crate::frontend::Frontend) and
//! [`worker`](crate::worker) wrap this around the handshake.

use std::path::{Path, PathBuf};

use scribble_ast::{bind_program, parse_program, TypeRegistry};
use scribble_base::{CompileError, Interner};
use scribble_codegen_arm64::{assemble, emit_program, link as link_objects, Assembly, LinkOptions, Target};
use scribble_ir::lower_program;

/// Everything a successful compile produced, for a caller that wants to
/// inspect intermediate state (`--list-ir`) or run the result.
pub struct CompileArtifacts {
    pub assemblies: Vec<Assembly>,
    pub objects: Vec<PathBuf>,
    pub binary: Option<PathBuf>,
    pub ir_listing: String,
}

/// Runs every stage over `source`, stopping at the first stage that
/// fails. `entry_point_name` names the function codegen flags as the
/// program's entry (`main`, conventionally); `link` controls whether the
/// assembled objects are linked into a binary.
pub fn compile_source(
    source: &str,
    file_name: &str,
    entry_point_name: Option<&str>,
    target: Target,
    link: bool,
    options: &LinkOptions,
) -> Result<CompileArtifacts, CompileError> {
    let mut interner = Interner::new();

    let (syntax, root) = parse_program(source, file_name, &mut interner).map_err(CompileError::Parser)?;

    let mut types = TypeRegistry::new(&mut interner);
    let (bound, bound_root) = bind_program(&syntax, root, &mut types, &interner).map_err(CompileError::Bind)?;

    let program = lower_program(&bound, bound_root, entry_point_name, &mut interner);
    let ir_listing = format_ir(&program, &interner);
    log::debug!("lowered {} module(s)", program.modules.len());

    let mut assemblies = emit_program(&program, &types, &interner, target);

    let mut objects = Vec::new();
    for assembly in &mut assemblies {
        let bare_name = assembly.module_name.clone();
        if let Some(obj) = assemble(assembly, &bare_name, options)? {
            objects.push(obj);
        }
    }

    let binary = if link && !objects.is_empty() {
        let bin_name = Path::new(file_name).file_stem().and_then(|s| s.to_str()).unwrap_or("program").to_string();
        Some(link_objects(&objects, &bin_name, options)?)
    } else {
        None
    };

    Ok(CompileArtifacts { assemblies, objects, binary, ir_listing })
}

/// A plain-text dump of the lowered IR, one line per operation, for
/// `--list-ir`. Not the assembly text — that's `Assembly::to_text`.
fn format_ir(program: &scribble_ir::Program, interner: &Interner) -> String {
    let mut out = String::new();
    for module in &program.modules {
        out.push_str(&format!("module {}\n", interner.resolve(module.name)));
        for function in &module.functions {
            out.push_str(&format!(
                "  func {}{}\n",
                interner.resolve(function.name),
                if function.is_entry_point { " (entry)" } else { "" }
            ));
            for (i, op) in function.ops.iter().enumerate() {
                out.push_str(&format!("    {i:>3}: {op:?}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_compiles_down_to_an_entry_point_returning_zero() {
        let options = LinkOptions { target: Target::Linux, ..LinkOptions::default() };
        let artifacts = compile_source("func main() -> int { return 0; }", "main.scribble", Some("main"), Target::Linux, false, &options).unwrap();
        assert_eq!(artifacts.assemblies.len(), 1);
        assert!(artifacts.assemblies[0].has_main());
        assert!(artifacts.ir_listing.contains("entry"));
    }

    #[test]
    fn scenario_b_fails_at_the_bind_stage_with_an_undefined_identifier() {
        let options = LinkOptions::default();
        let err = compile_source("func main() -> int { return x; }", "main.scribble", Some("main"), Target::Linux, false, &options).unwrap_err();
        assert!(matches!(err, CompileError::Bind(_)));
    }

    #[test]
    fn malformed_source_fails_at_the_parse_stage() {
        let options = LinkOptions::default();
        let err = compile_source("func main( -> int { }", "main.scribble", Some("main"), Target::Linux, false, &options).unwrap_err();
        assert!(matches!(err, CompileError::Parser(_)));
    }
}
