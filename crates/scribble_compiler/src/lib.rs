//! The `scribble` frontend driver: CLI parsing (`cli`), the pure compile
//! pipeline (`pipeline`), the backend configuration it's handed
//! (`config`), and the frontend/worker split over `scribble-ipc`
//! (`frontend`, `worker`). [`run`] is the single entry point
//! `apps/scribble`'s `main` calls.

pub mod cli;
pub mod config;
pub mod frontend;
pub mod pipeline;
pub mod worker;

use std::fs;
use std::path::{Path, PathBuf};

pub use cli::Cli;
pub use config::BackendConfig;
pub use frontend::RunOutcome;

use scribble_codegen_arm64::{execute, LinkOptions, Target, BUILD_DIR};

/// Runs one invocation to completion and returns the process exit code.
/// A `--worker-socket` invocation (only ever set by a re-exec'd backend
/// process, never typed by a user) dispatches straight to
/// [`run_worker`] instead of starting a new frontend.
pub fn run(cli: Cli) -> i32 {
    if let Some(socket_path) = cli.worker_socket.clone() {
        return run_worker(&cli, &socket_path);
    }

    let source = match fs::read_to_string(&cli.program) {
        Ok(source) => source,
        Err(e) => return report_io_error(&cli.program, &e),
    };
    let file_name = cli.program.to_string_lossy().into_owned();
    let options = link_options(&cli);

    let outcome = match frontend::run(&cli, source, file_name, Some("main".to_string()), Target::host(), true, options) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return 1;
        }
    };

    if !outcome.succeeded() {
        let message = outcome.report.panic_message.unwrap_or_else(|| "compile failed".to_string());
        eprintln!("ERROR: {}: {message}", cli.program.display());
        return 1;
    }

    if cli.list_ir {
        if let Some(artifacts) = &outcome.artifacts {
            println!("{}", artifacts.ir_listing);
        }
    }

    let binary = outcome.artifacts.as_ref().and_then(|a| a.binary.clone()).or_else(|| default_binary_path(&cli.program));
    let Some(binary) = binary else {
        return 0;
    };

    run_binary(&binary, cli.exit_code)
}

fn run_binary(binary: &Path, print_exit_code: bool) -> i32 {
    match execute(binary) {
        Ok(code) => {
            if print_exit_code {
                println!("{code}");
            }
            code
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            1
        }
    }
}

fn link_options(cli: &Cli) -> LinkOptions {
    LinkOptions { keep_assembly: cli.keep_assembly, scribble_dir: PathBuf::from(BUILD_DIR), target: Target::host() }
}

fn report_io_error(program: &Path, err: &std::io::Error) -> i32 {
    eprintln!("ERROR: {}: IOError: {err}", program.display());
    1
}

/// A spawned (non-`--threaded`) worker's `CompileArtifacts` live in a
/// process the frontend never shares memory with; the linked binary
/// still lands on disk at the same place a threaded compile's would,
/// named after the entry source file's stem.
fn default_binary_path(program: &Path) -> Option<PathBuf> {
    let stem = program.file_stem()?.to_str()?;
    let path = PathBuf::from(stem);
    path.exists().then_some(path)
}

/// The worker half of a re-exec'd backend process: connects back to the
/// frontend's listening socket, compiles and links `cli.program`, and
/// reports exactly 0 (handshake reached `goodbye`) or 1 (it didn't).
/// Never runs the linked binary itself — that stays the frontend's job,
/// once it locates the binary `worker::run`'s codegen stage left on disk.
fn run_worker(cli: &Cli, socket_path: &Path) -> i32 {
    use std::os::unix::net::UnixStream;

    let stream = match UnixStream::connect(socket_path) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("ERROR: failed to connect to frontend socket: {e}");
            return 1;
        }
    };

    let source = match fs::read_to_string(&cli.program) {
        Ok(source) => source,
        Err(e) => return report_io_error(&cli.program, &e),
    };
    let file_name = cli.program.to_string_lossy().into_owned();
    let options = link_options(cli);

    let args = worker::WorkerArgs {
        source: &source,
        file_name: &file_name,
        entry_point_name: Some("main"),
        target: Target::host(),
        link: true,
        options: &options,
    };

    match worker::run(stream, args) {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
