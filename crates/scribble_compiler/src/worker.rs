//! The worker side of the handshake: `hello` → `fetch_config` → the
//! lex/parse/bind/lower/codegen pipeline, bracketed per-stage by
//! `start`/`done` for whichever stages the fetched config names as
//! traced → `goodbye`, or `errors` then `panic` at the first stage that
//! fails.
//!
//! `lex` and `parse` bracket the same call: `scribble_ast::parse_program`
//! lexes on demand rather than running a separate tokenization pass, so
//! there is no standalone lex stage to bracket independently. Both names
//! are still reported, in case a caller only traced one of them.

use std::io::{Read, Write};
use std::path::Path;

use scribble_ast::{bind_program, parse_program, TypeRegistry};
use scribble_base::{CompileError, Interner};
use scribble_codegen_arm64::{assemble, emit_program, link as link_objects, Assembly, LinkOptions, Target};
use scribble_ipc::WorkerChannel;
use scribble_ir::lower_program;

use crate::config::BackendConfig;
use crate::pipeline::CompileArtifacts;

/// Everything `run` needs to drive one compile; owned by the caller
/// (either the in-process `--threaded` worker thread or the spawned
/// worker process's `main`) so this module stays free of CLI parsing.
pub struct WorkerArgs<'a> {
    pub source: &'a str,
    pub file_name: &'a str,
    pub entry_point_name: Option<&'a str>,
    pub target: Target,
    pub link: bool,
    pub options: &'a LinkOptions,
}

/// Runs the handshake and the compile it wraps over `stream`, returning
/// the produced artifacts on success. The caller decides what happens to
/// a returned `Err`; this function has already told the frontend about it
/// over the wire before returning it.
pub fn run<S: Read + Write>(stream: S, args: WorkerArgs) -> Result<CompileArtifacts, CompileError> {
    let mut channel = WorkerChannel::new(stream);
    channel.hello()?;

    let config_value = channel.fetch_config()?;
    let config: BackendConfig =
        serde_json::from_value(config_value).map_err(|e| CompileError::Json { offset: 0, message: e.to_string() })?;

    match run_stages(&mut channel, &config, &args) {
        Ok(artifacts) => {
            channel.goodbye()?;
            Ok(artifacts)
        }
        Err((stage, err)) => {
            let errors = serde_json::json!({ "message": err.to_string() });
            let _ = channel.stage_errors(&stage, &errors);
            let _ = channel.panic(&err.to_string());
            Err(err)
        }
    }
}

/// Runs `f`, posting `start`/`done` around it for each name in `names`
/// whose `debug` flag is set. On failure, tags the error with the last
/// (most specific) name in `names` for the caller's `errors`/`panic` post.
fn run_stage<S, T>(
    channel: &mut WorkerChannel<S>,
    config: &BackendConfig,
    names: &[&str],
    f: impl FnOnce() -> Result<T, CompileError>,
) -> Result<T, (String, CompileError)>
where
    S: Read + Write,
{
    let traced: Vec<&str> = names.iter().copied().filter(|n| config.stage_is_debugged(n)).collect();
    let tag = names.last().copied().unwrap_or("compile").to_string();

    for name in &traced {
        channel.stage_start(name).map_err(|e| (name.to_string(), e))?;
    }
    let result = f().map_err(|e| (tag.clone(), e))?;
    for name in &traced {
        channel.stage_done(name).map_err(|e| (name.to_string(), e))?;
    }
    Ok(result)
}

fn run_stages<S: Read + Write>(
    channel: &mut WorkerChannel<S>,
    config: &BackendConfig,
    args: &WorkerArgs,
) -> Result<CompileArtifacts, (String, CompileError)> {
    let mut interner = Interner::new();

    let (syntax, root) = run_stage(channel, config, &["lex", "parse"], || {
        parse_program(args.source, args.file_name, &mut interner).map_err(CompileError::Parser)
    })?;

    let (bound, bound_root, types) = run_stage(channel, config, &["bind"], || {
        let mut types = TypeRegistry::new(&mut interner);
        let (bound, bound_root) = bind_program(&syntax, root, &mut types, &interner).map_err(CompileError::Bind)?;
        Ok((bound, bound_root, types))
    })?;

    let program = run_stage(channel, config, &["lower"], || {
        Ok(lower_program(&bound, bound_root, args.entry_point_name, &mut interner))
    })?;
    let ir_listing = format_ir(&program, &interner);

    let (assemblies, objects, binary) = run_stage(channel, config, &["codegen"], || {
        let mut assemblies = emit_program(&program, &types, &interner, args.target);
        let mut objects = Vec::new();
        for assembly in &mut assemblies {
            let bare_name = assembly.module_name.clone();
            if let Some(obj) = assemble(assembly, &bare_name, args.options)? {
                objects.push(obj);
            }
        }
        let binary = if args.link && !objects.is_empty() {
            let bin_name = Path::new(args.file_name).file_stem().and_then(|s| s.to_str()).unwrap_or("program").to_string();
            Some(link_objects(&objects, &bin_name, args.options)?)
        } else {
            None
        };
        Ok((assemblies, objects, binary))
    })?;

    Ok(CompileArtifacts { assemblies, objects, binary, ir_listing })
}

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
    use std::os::unix::net::UnixStream;

    fn worker_args(source: &'static str, options: &LinkOptions) -> WorkerArgs<'static> {
        WorkerArgs {
            source,
            file_name: "main.scribble",
            entry_point_name: Some("main"),
            target: Target::Linux,
            link: false,
            options,
        }
    }

    /// Minimal frontend double: answers `hello`/`config` then records
    /// every other request's path, replying `200 OK` to each, until the
    /// worker's final `goodbye` or `panic`.
    fn run_frontend_double(mut stream: UnixStream, config: BackendConfig) -> Vec<String> {
        use scribble_ipc::{read_request, write_response, Response, StatusCode};

        let mut events = Vec::new();
        loop {
            let request = read_request(&mut stream).unwrap();
            match request.path.as_str() {
                "/hello" => write_response(&mut stream, &Response::empty(StatusCode::Hello)).unwrap(),
                "/bootstrap/config" => {
                    let body = serde_json::to_value(&config).unwrap();
                    write_response(&mut stream, &Response::json(StatusCode::Ok, &body).unwrap()).unwrap();
                }
                "/goodbye" | "/panic" => {
                    events.push(request.path.clone());
                    write_response(&mut stream, &Response::empty(StatusCode::Ok)).unwrap();
                    return events;
                }
                other => {
                    events.push(other.to_string());
                    write_response(&mut stream, &Response::empty(StatusCode::Ok)).unwrap();
                }
            }
        }
    }

    #[test]
    fn successful_compile_reports_traced_stages_and_ends_with_goodbye() {
        let (frontend, worker_stream) = UnixStream::pair().unwrap();
        let config = BackendConfig::from_trace_spec(Some("lower;codegen"), false, false);
        let config_for_frontend = config.clone();

        let frontend_thread = std::thread::spawn(move || run_frontend_double(frontend, config_for_frontend));

        let options = LinkOptions { target: Target::Linux, ..LinkOptions::default() };
        let artifacts = run(worker_stream, worker_args("func main() -> int { return 0; }", &options)).unwrap();
        assert!(artifacts.ir_listing.contains("entry"));

        let events = frontend_thread.join().unwrap();
        assert!(events.contains(&"/lower/start".to_string()));
        assert!(events.contains(&"/codegen/done".to_string()));
        assert!(!events.iter().any(|e| e.starts_with("/lex/") || e.starts_with("/parse/") || e.starts_with("/bind/")));
        assert_eq!(events.last().unwrap(), "/goodbye");
    }

    #[test]
    fn failing_compile_reports_errors_then_panic_and_never_goodbye() {
        let (frontend, worker_stream) = UnixStream::pair().unwrap();
        let config = BackendConfig::from_trace_spec(Some("bind"), false, false);
        let config_for_frontend = config.clone();

        let frontend_thread = std::thread::spawn(move || run_frontend_double(frontend, config_for_frontend));

        let options = LinkOptions::default();
        let err = run(worker_stream, worker_args("func main() -> int { return x; }", &options)).unwrap_err();
        assert!(matches!(err, CompileError::Bind(_)));

        let events = frontend_thread.join().unwrap();
        let start_ix = events.iter().position(|e| e == "/bind/start").unwrap();
        let errors_ix = events.iter().position(|e| e == "/bind/errors").unwrap();
        let panic_ix = events.iter().position(|e| e == "/panic").unwrap();
        assert!(start_ix < errors_ix);
        assert!(errors_ix < panic_ix);
        assert!(!events.contains(&"/goodbye".to_string()));
    }
}
