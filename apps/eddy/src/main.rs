//! A minimal `eddy` entry point. The widget tree, input handling, palette,
//! and rendering are Non-goals (spec.md §1); what's left is the part that
//! actually touches the compiler core's shared surfaces: lexing a source
//! file and reporting diagnostics, optionally dialling an LSP server over
//! its stdio, and loading/saving the persisted UI state blob.

mod server;
mod state;
mod terminal;

use std::path::PathBuf;

use clap::Parser;
use scribble_ast::{bind_program, parse_program, TypeRegistry};
use scribble_base::Interner;
use scribble_process::ManagedProcess;

use eddy_lsp_client::LspClient;
use server::ServerStream;
use state::PersistedState;
use terminal::{StdoutTerminal, Terminal};

/// `eddy [--check] [--lsp-server <cmd>] [file]`
#[derive(Debug, Parser)]
#[command(name = "eddy", about = "Open a scribble source file")]
struct Cli {
    /// Lex, parse, and bind `file`, reporting diagnostics, instead of
    /// opening it for editing (which this entry point doesn't implement).
    #[arg(long)]
    check: bool,

    /// A language server command to launch and hand an `initialize`
    /// request to, e.g. `--lsp-server scribble-lsp`.
    #[arg(long = "lsp-server")]
    lsp_server: Option<String>,

    /// The source file to open.
    file: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut term = StdoutTerminal;

    let state_path = PersistedState::default_path();
    let mut state = state_path.as_deref().map(PersistedState::load).transpose().unwrap_or_default().unwrap_or_default();

    if let Some(command) = &cli.lsp_server {
        if let Err(e) = handshake_lsp_server(command, &mut term) {
            term.diagnostic(&format!("ERROR: lsp-server: {e}"));
            std::process::exit(1);
        }
    }

    if let Some(file) = &cli.file {
        if cli.check {
            std::process::exit(check_file(file, &mut term));
        }
        term.status(&format!("eddy: opened {} (no UI in this build)", file.display()));
    } else {
        term.status("eddy: no file given");
    }

    state.window_width = state.window_width.max(80);
    if let Some(path) = &state_path {
        if let Err(e) = state.save(path) {
            log::warn!("failed to persist eddy state to {}: {e}", path.display());
        }
    }
}

/// Lexes, parses, and binds `file`, reporting every `BindError` found
/// (the binder accumulates rather than stopping at the first) via
/// `term.diagnostic`. Returns the process exit code.
fn check_file(file: &PathBuf, term: &mut dyn Terminal) -> i32 {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            term.diagnostic(&format!("ERROR: {}: {e}", file.display()));
            return 1;
        }
    };
    let file_name = file.to_string_lossy().into_owned();

    let mut interner = Interner::new();
    let (syntax, root) = match parse_program(&source, &file_name, &mut interner) {
        Ok(parsed) => parsed,
        Err(e) => {
            term.diagnostic(&format!("ERROR: {file_name}: {e}"));
            return 1;
        }
    };

    let mut types = TypeRegistry::new(&mut interner);
    match bind_program(&syntax, root, &mut types, &interner) {
        Ok((_bound, _root)) => {
            term.status(&format!("{file_name}: OK"));
            0
        }
        Err(errors) => {
            for error in &errors {
                term.diagnostic(&format!("ERROR: {file_name}: {error}"));
            }
            1
        }
    }
}

/// Spawns `command`, sends `initialize`, and reports the server's
/// declared capabilities. Exercises the same `ManagedProcess` +
/// `ServerStream` + `LspClient` path a real editor session would use to
/// talk to a language server, without wiring up document synchronisation.
fn handshake_lsp_server(command: &str, term: &mut dyn Terminal) -> Result<(), Box<dyn std::error::Error>> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or("empty --lsp-server command")?;
    let args: Vec<&str> = parts.collect();

    let process = ManagedProcess::spawn(program, &args)?;
    let stream = ServerStream::new(process);
    let mut client = LspClient::new(stream);

    let params = serde_json::json!({ "processId": std::process::id(), "capabilities": {} });
    let result = client.request("initialize", params)?;
    term.status(&format!("lsp-server {command}: initialize -> {result}"));
    Ok(())
}
