//! Adapts a spawned language server's stdio — a [`scribble_process::ManagedProcess`]'s
//! condition-variable-backed [`ReadPipe`]/[`WritePipe`] halves — into the
//! single blocking `Read + Write` stream [`eddy_lsp_client::LspClient`]
//! expects. The process subsystem's pipes are drained by a background
//! thread into a growing buffer rather than exposing a blocking `Read`
//! directly (spec.md §4.7); this adapter is the glue that lets the LSP
//! client treat that buffer as an ordinary blocking stream.

use std::io::{self, Read, Write};

use scribble_process::ManagedProcess;

/// Owns the whole [`ManagedProcess`] rather than splitting off just its
/// stdin/stdout: a language server that's still running when this stream
/// is dropped would otherwise leave its stderr-draining reader thread
/// blocked on a child that never closes the pipe. `Drop` kills the child
/// first, so every reader thread observes EOF and its `join` returns
/// promptly.
pub struct ServerStream {
    process: ManagedProcess,
    /// Bytes already pulled out of `stdout` via `current()` but not yet
    /// handed to a caller of `read()`.
    pending: Vec<u8>,
}

impl ServerStream {
    pub fn new(process: ManagedProcess) -> Self {
        ServerStream { process, pending: Vec::new() }
    }
}

impl Read for ServerStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            if !self.process.stdout.expect() {
                return Ok(0);
            }
            self.pending = self.process.stdout.current();
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl Write for ServerStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.process.stdin.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.process.stdin.flush()
    }
}

impl Drop for ServerStream {
    fn drop(&mut self) {
        let _ = self.process.kill();
    }
}
