//! Thin binary wrapper around [`scribble_compiler::run`]. All option
//! parsing, pipeline orchestration, and IPC live in the library crate;
//! this binary only initialises logging and maps the returned exit code.

use clap::Parser;
use scribble_compiler::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    std::process::exit(scribble_compiler::run(cli));
}
