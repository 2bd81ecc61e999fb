//! Frontend half of the handshake: binds or pairs the socket a compile's
//! worker talks over, spawns that worker (in-process on a thread for
//! `--threaded`, or as a freshly re-exec'd process otherwise), and serves
//! its requests until `/goodbye` or `/panic` ends the exchange. spec.md
//! §5: "the backend runs as a separate process connected over the same
//! UNIX socket unless `--threaded` asks it to share the frontend's
//! process on a worker task instead."

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use scribble_base::CompileError;
use scribble_codegen_arm64::{LinkOptions, Target};
use scribble_ipc::{read_request, write_response, Listener, Response, StatusCode};
use scribble_process::ManagedProcess;

use crate::cli::Cli;
use crate::config::BackendConfig;
use crate::pipeline::CompileArtifacts;
use crate::worker::{self, WorkerArgs};

/// What the frontend observed over the wire during one compile: every
/// `start`/`done` path a traced stage posted, every stage's reported
/// errors, and the worker's final word.
#[derive(Debug, Default)]
pub struct RunReport {
    pub stage_events: Vec<String>,
    pub stage_errors: Vec<(String, serde_json::Value)>,
    pub panic_message: Option<String>,
    pub goodbye: bool,
}

/// Everything a compile left behind: the wire-level report, plus the
/// produced artifacts when the frontend had direct access to them
/// (`--threaded` mode only — a spawned worker's `CompileArtifacts` live
/// in a process the frontend doesn't share memory with; the caller finds
/// the linked binary on disk instead, by the same naming convention the
/// worker used).
pub struct RunOutcome {
    pub report: RunReport,
    pub artifacts: Option<CompileArtifacts>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.report.goodbye && self.report.panic_message.is_none()
    }
}

/// Serves one worker connection: answers `/hello` and `/bootstrap/config`
/// itself, records every stage event and error, and returns once the
/// worker posts `/goodbye` or `/panic`.
fn serve<S: Read + Write>(mut stream: S, config: &BackendConfig) -> Result<RunReport, CompileError> {
    let mut report = RunReport::default();
    let config_json = serde_json::to_value(config).map_err(|e| CompileError::Json { offset: 0, message: e.to_string() })?;

    loop {
        let request = read_request(&mut stream)?;
        match request.path.as_str() {
            "/hello" => write_response(&mut stream, &Response::empty(StatusCode::Hello))?,
            "/bootstrap/config" => write_response(&mut stream, &Response::json(StatusCode::Ok, &config_json)?)?,
            "/goodbye" => {
                write_response(&mut stream, &Response::empty(StatusCode::Ok))?;
                report.goodbye = true;
                return Ok(report);
            }
            "/panic" => {
                let body = request.json_body()?;
                let message = body
                    .and_then(|v| v.get("message").and_then(|m| m.as_str().map(str::to_string)))
                    .unwrap_or_default();
                write_response(&mut stream, &Response::empty(StatusCode::Ok))?;
                report.panic_message = Some(message);
                return Ok(report);
            }
            path if path.ends_with("/errors") => {
                let stage = path.trim_start_matches('/').trim_end_matches("/errors").to_string();
                let body = request.json_body()?.unwrap_or(serde_json::Value::Null);
                report.stage_errors.push((stage, body));
                write_response(&mut stream, &Response::empty(StatusCode::Ok))?;
            }
            path if path.ends_with("/start") || path.ends_with("/done") => {
                report.stage_events.push(path.to_string());
                write_response(&mut stream, &Response::empty(StatusCode::Ok))?;
            }
            other => {
                let message = format!("unrecognised request path '{other}'");
                write_response(&mut stream, &Response::empty(StatusCode::NotFound))?;
                return Err(CompileError::Http(message));
            }
        }
    }
}

/// Runs the backend in-process on a worker thread, sharing an in-memory
/// socket pair (`UnixStream::pair`) with this call instead of a real
/// UNIX-domain path.
fn run_threaded(
    source: String,
    file_name: String,
    entry_point_name: Option<String>,
    target: Target,
    link: bool,
    options: LinkOptions,
    config: BackendConfig,
) -> Result<RunOutcome, CompileError> {
    let (frontend_end, worker_end) = UnixStream::pair().map_err(|e| CompileError::Io(e.to_string()))?;

    let worker_thread = std::thread::spawn(move || {
        let args = WorkerArgs {
            source: &source,
            file_name: &file_name,
            entry_point_name: entry_point_name.as_deref(),
            target,
            link,
            options: &options,
        };
        worker::run(worker_end, args)
    });

    let report = serve(frontend_end, &config)?;
    let artifacts = match worker_thread.join() {
        Ok(Ok(artifacts)) => Some(artifacts),
        Ok(Err(_)) => None,
        Err(_) => None,
    };

    Ok(RunOutcome { report, artifacts })
}

/// Re-execs the current binary with a hidden `--worker-socket` flag
/// pointing at a freshly bound listener, so the worker half runs as a
/// genuinely separate process connected back over a real UNIX-domain
/// socket.
fn run_spawned(cli: &Cli, config: &BackendConfig) -> Result<RunOutcome, CompileError> {
    let current_exe = std::env::current_exe().map_err(|e| CompileError::Io(e.to_string()))?;

    let socket_dir = tempfile::tempdir().map_err(|e| CompileError::Io(e.to_string()))?;
    let socket_path: PathBuf = socket_dir.path().join("scribble.sock");
    let listener = Listener::bind(&socket_path)?;

    let mut child_args: Vec<String> = Vec::new();
    if let Some(trace) = &cli.trace {
        child_args.push(format!("--trace={trace}"));
    }
    if cli.keep_assembly {
        child_args.push("--keep-assembly".to_string());
    }
    if cli.list_ir {
        child_args.push("--list-ir".to_string());
    }
    child_args.push("--worker-socket".to_string());
    child_args.push(socket_path.to_string_lossy().into_owned());
    child_args.push(cli.program.to_string_lossy().into_owned());
    child_args.extend(cli.args.iter().cloned());

    let process = ManagedProcess::spawn(&current_exe, &child_args).map_err(|e| CompileError::Io(e.to_string()))?;

    let stream = listener.accept()?;
    let report = serve(stream, config)?;

    let _ = process.finish();

    Ok(RunOutcome { report, artifacts: None })
}

/// Entry point `lib.rs` calls: decides `--threaded` vs a spawned worker
/// process and drives either to completion.
pub fn run(cli: &Cli, source: String, file_name: String, entry_point_name: Option<String>, target: Target, link: bool, options: LinkOptions) -> Result<RunOutcome, CompileError> {
    let config = BackendConfig::from_trace_spec(cli.trace.as_deref(), cli.keep_assembly, cli.list_ir);

    if cli.threaded {
        run_threaded(source, file_name, entry_point_name, target, link, options, config)
    } else {
        run_spawned(cli, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threaded_backend_reports_goodbye_for_a_successful_compile() {
        let options = LinkOptions { target: Target::Linux, ..LinkOptions::default() };
        let outcome = run_threaded(
            "func main() -> int { return 0; }".to_string(),
            "main.scribble".to_string(),
            Some("main".to_string()),
            Target::Linux,
            false,
            options,
            BackendConfig::from_trace_spec(None, false, false),
        )
        .unwrap();
        assert!(outcome.succeeded());
        assert!(outcome.artifacts.is_some());
    }

    #[test]
    fn threaded_backend_reports_panic_for_an_undefined_identifier() {
        let options = LinkOptions::default();
        let outcome = run_threaded(
            "func main() -> int { return x; }".to_string(),
            "main.scribble".to_string(),
            Some("main".to_string()),
            Target::Linux,
            false,
            options,
            BackendConfig::from_trace_spec(Some("bind"), false, false),
        )
        .unwrap();
        assert!(!outcome.succeeded());
        assert!(outcome.report.panic_message.is_some());
        assert!(!outcome.report.stage_errors.is_empty());
    }
}
