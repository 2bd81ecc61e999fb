//! Drives `as`/`ld` over a compilation's emitted assemblies and, on
//! request, executes the resulting binary.
//!
//! Grounded on `examples/original_source/scribble/src/arch/arm64/arm64.c`'s
//! `output_arm64`: write each `Assembly` that has exports to `.scribble/`,
//! assemble it with `as`, drop the `.s` file unless `keep-assembly` was
//! requested, link every resulting `.o` with `ld` (Darwin/Linux argument
//! lists differ), and, if asked, run the binary through
//! `scribble-process`'s `ManagedProcess` so its output streams back.

use std::path::{Path, PathBuf};
use std::process::Command;

use scribble_base::CompileError;
use scribble_process::ManagedProcess;

use crate::assembly::Assembly;
use crate::target::Target;

/// Where the generated build artefacts land — mirrors the original's
/// `.scribble` working directory.
pub const BUILD_DIR: &str = ".scribble";

#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Keep the `.s` text alongside the `.o` object instead of deleting it
    /// once assembly succeeds.
    pub keep_assembly: bool,
    /// Directory scribble's own runtime library (`libscribblert`, on
    /// Darwin also `libbase`/`libscribblestart`) lives under, passed to
    /// the linker as `-L<dir>/lib`.
    pub scribble_dir: PathBuf,
    pub target: Target,
}

impl Default for LinkOptions {
    fn default() -> Self {
        LinkOptions { keep_assembly: false, scribble_dir: PathBuf::from("."), target: Target::host() }
    }
}

fn run(program: &str, args: &[&str]) -> Result<(), CompileError> {
    log::debug!("running {program} {}", args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| CompileError::Process(format!("failed to spawn {program}: {e}")))?;
    if !status.success() {
        return Err(CompileError::Process(format!(
            "{program} exited with {}",
            status.code().map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
        )));
    }
    Ok(())
}

/// Writes `text` to `path` only if it differs from whatever is already
/// there (or nothing is there yet) — spec.md §4.6: "write `.scribble/<basename>.s`
/// only if the assembly text differs from any existing file", matching
/// `assembly_save_and_assemble`'s behaviour in the original. Skipping an
/// identical rewrite keeps a rebuild from disturbing the file's mtime
/// when nothing actually changed.
fn write_if_changed(path: &Path, text: &str) -> Result<(), CompileError> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == text {
            return Ok(());
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

/// Writes `assembly`'s serialised text to `<BUILD_DIR>/<bare_name>.s`,
/// assembles it, and returns the resulting object file path, or `None` if
/// the assembly has no exports (nothing to link in).
pub fn assemble(assembly: &mut Assembly, bare_name: &str, options: &LinkOptions) -> Result<Option<PathBuf>, CompileError> {
    let Some(text) = assembly.to_text() else {
        return Ok(None);
    };
    std::fs::create_dir_all(BUILD_DIR)?;
    let asm_path = Path::new(BUILD_DIR).join(format!("{bare_name}.s"));
    write_if_changed(&asm_path, &text)?;

    let obj_path = Path::new(BUILD_DIR).join(format!("{bare_name}.o"));
    run("as", &[asm_path.to_str().expect("utf8 path"), "-o", obj_path.to_str().expect("utf8 path")])?;

    if !options.keep_assembly {
        let _ = std::fs::remove_file(&asm_path);
    }
    Ok(Some(obj_path))
}

/// Links `objects` into an executable named `bin_name` in the current
/// directory, choosing Darwin's or Linux's `ld` argument shape.
pub fn link(objects: &[PathBuf], bin_name: &str, options: &LinkOptions) -> Result<PathBuf, CompileError> {
    if objects.is_empty() {
        return Err(CompileError::Process("no object files to link (no main() function found)".to_string()));
    }
    let lib_dir = options.scribble_dir.join("lib");
    let lib_arg = format!("-L{}", lib_dir.display());

    let mut args: Vec<String> = vec!["-o".to_string(), bin_name.to_string()];
    match options.target {
        Target::Darwin => {
            args.extend([
                "-lbase".to_string(),
                "-lscribblert".to_string(),
                "-lscribblestart".to_string(),
                "-lSystem".to_string(),
                "-e".to_string(),
                "_start".to_string(),
                "-arch".to_string(),
                "arm64".to_string(),
                lib_arg,
            ]);
        }
        Target::Linux => {
            args.extend(["-lscribblert".to_string(), "-e".to_string(), "_start".to_string(), "-A".to_string(), "aarch64".to_string(), lib_arg]);
        }
    }
    args.extend(objects.iter().map(|p| p.display().to_string()));

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    run("ld", &arg_refs)?;
    Ok(PathBuf::from(format!("./{bin_name}")))
}

/// Runs the freshly linked binary, draining its stdout/stderr through
/// `scribble-process` and returning its exit code.
pub fn execute(binary: &Path) -> Result<i32, CompileError> {
    let empty: [&str; 0] = [];
    let proc = ManagedProcess::spawn(binary, &empty).map_err(|e| CompileError::Process(e.to_string()))?;
    let status = proc.finish().map_err(|e| CompileError::Process(e.to_string()))?;
    Ok(status.code().unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{ArmFunction, FunctionKind};
    use scribble_base::IdAllocator;

    #[test]
    fn link_with_no_objects_is_an_error() {
        let options = LinkOptions::default();
        let err = link(&[], "out", &options).unwrap_err();
        assert!(matches!(err, CompileError::Process(_)));
    }

    #[test]
    fn assemble_returns_none_for_an_empty_assembly() {
        let mut assembly = Assembly::new("empty", Target::Linux, IdAllocator::starting_at(5000));
        let options = LinkOptions::default();
        let result = assemble(&mut assembly, "empty", &options).expect("assemble does not error on empty input");
        assert!(result.is_none());
    }

    #[test]
    fn write_if_changed_skips_an_identical_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.s");
        write_if_changed(&path, "mov w0, #0\n").unwrap();
        let first_written = std::fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        write_if_changed(&path, "mov w0, #0\n").unwrap();
        let second_written = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(first_written, second_written, "identical content must not be rewritten");
    }

    #[test]
    fn write_if_changed_rewrites_when_content_differs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.s");
        write_if_changed(&path, "mov w0, #0\n").unwrap();
        write_if_changed(&path, "mov w0, #1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mov w0, #1\n");
    }

    #[test]
    fn assembly_with_exports_would_attempt_assembly() {
        // Exercises the text-generation path only; invoking the real `as`
        // is left to integration coverage run on an actual AArch64 host.
        let mut assembly = Assembly::new("has_main", Target::Linux, IdAllocator::starting_at(5000));
        let mut func = ArmFunction::new("main", FunctionKind::Scribble);
        func.code.add_line("mov w0, #0");
        func.is_main = true;
        assembly.push_function(func);
        assert!(assembly.to_text().is_some());
    }
}
