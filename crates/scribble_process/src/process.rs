//! Spawns a child process and wires its stdio to [`crate::pipe`] handles.
//!
//! Grounded on `examples/original_source/base/pipe.c`'s process-launch
//! half (the code that pairs a spawned child's fds with `ReadPipe`s/
//! `WritePipe`s) and `spec.md` §4.7's "execute stage" description: the
//! compiled AArch64 binary is run as a child, its stdout and stderr are
//! each drained by a `ReadPipe`, and its stdin is exposed as a
//! `WritePipe`.

use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::pipe::{ReadPipe, WritePipe};

/// A running child process with its stdio wired to pipe handles.
pub struct ManagedProcess {
    child: Child,
    pub stdin: WritePipe<std::process::ChildStdin>,
    pub stdout: ReadPipe,
    pub stderr: ReadPipe,
}

impl ManagedProcess {
    /// Spawns `program` with `args`, piping all three standard streams.
    /// Used by the AArch64 backend's execute stage to run a freshly
    /// linked binary and stream its output back to the frontend.
    pub fn spawn(program: impl AsRef<Path>, args: &[impl AsRef<str>]) -> io::Result<Self> {
        let mut command = Command::new(program.as_ref());
        command.args(args.iter().map(|a| a.as_ref()));
        command.stdin(Stdio::piped());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let stdin = WritePipe::new(child.stdin.take().expect("stdin was piped"));
        let stdout = ReadPipe::spawn(child.stdout.take().expect("stdout was piped"));
        let stderr = ReadPipe::spawn(child.stderr.take().expect("stderr was piped"));

        Ok(ManagedProcess { child, stdin, stdout, stderr })
    }

    /// Closes stdin (so a child blocked reading it observes EOF) and
    /// blocks until the process exits.
    pub fn finish(mut self) -> io::Result<ExitStatus> {
        drop(self.stdin);
        self.child.wait()
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Forcibly terminates the process without waiting for a graceful
    /// exit — used when the frontend aborts a running execute stage.
    pub fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_true_exits_successfully() {
        let empty: [&str; 0] = [];
        let proc = ManagedProcess::spawn("true", &empty).expect("spawn true");
        let status = proc.finish().expect("wait on true");
        assert!(status.success());
    }

    #[test]
    fn stdout_is_captured_through_read_pipe() {
        let proc = ManagedProcess::spawn("echo", &["hello"]).expect("spawn echo");
        assert!(proc.stdout.expect());
        let out = proc.stdout.current();
        assert_eq!(out, b"hello\n");
        proc.finish().expect("wait on echo");
    }

    #[test]
    fn kill_terminates_a_long_running_child() {
        let mut proc = ManagedProcess::spawn("sleep", &["30"]).expect("spawn sleep");
        proc.kill().expect("kill sleep");
        let status = proc.child.wait().expect("wait after kill");
        assert!(!status.success());
    }
}
