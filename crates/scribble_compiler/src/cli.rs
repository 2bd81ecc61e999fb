//! The `scribble` CLI surface (spec.md §6): a program path, passthrough
//! arguments for the `execute` stage, and five `--<option>[=<value>]`
//! flags ahead of the program.

use std::path::PathBuf;

use clap::Parser;

/// `scribble [--trace[=cats]] [--threaded] [--keep-assembly] [--list-ir]
/// [--exit-code] <program> [args...]`
#[derive(Debug, Parser)]
#[command(name = "scribble", about = "Compile and run a scribble program")]
pub struct Cli {
    /// Enable trace categories (`cat1;cat2;...`); bare `--trace` enables all.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub trace: Option<String>,

    /// Run the backend in-process on a worker thread instead of spawning
    /// a separate process connected over the same IPC socket.
    #[arg(long)]
    pub threaded: bool,

    /// Keep the `.s` assembly files alongside the `.o` objects.
    #[arg(long = "keep-assembly")]
    pub keep_assembly: bool,

    /// Dump the lowered IR after generation.
    #[arg(long = "list-ir")]
    pub list_ir: bool,

    /// Print the executed program's exit code to stdout.
    #[arg(long = "exit-code")]
    pub exit_code: bool,

    /// The program directory or entry source file.
    pub program: PathBuf,

    /// Arguments passed through to the compiled program when it runs.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Internal: used by a spawned backend worker to dial back into the
    /// frontend's listening socket. Never set by a user invocation.
    #[arg(long = "worker-socket", hide = true)]
    pub worker_socket: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_trace_flag_defaults_to_true() {
        let cli = Cli::parse_from(["scribble", "--trace", "prog.scribble"]);
        assert_eq!(cli.trace.as_deref(), Some("true"));
    }

    #[test]
    fn trace_accepts_a_category_list() {
        let cli = Cli::parse_from(["scribble", "--trace=lex;bind", "prog.scribble"]);
        assert_eq!(cli.trace.as_deref(), Some("lex;bind"));
    }

    #[test]
    fn trailing_args_after_the_program_are_passthrough() {
        let cli = Cli::parse_from(["scribble", "prog.scribble", "--unrelated", "1"]);
        assert_eq!(cli.args, vec!["--unrelated".to_string(), "1".to_string()]);
    }

    #[test]
    fn option_flags_default_to_false() {
        let cli = Cli::parse_from(["scribble", "prog.scribble"]);
        assert!(!cli.threaded);
        assert!(!cli.keep_assembly);
        assert!(!cli.list_ir);
        assert!(!cli.exit_code);
    }
}
