//! Condition-variable-synchronised read and write pipe halves.
//!
//! Grounded on `examples/original_source/base/pipe.c`: a `ReadPipe` owns a
//! monotonically-growing buffer and a condition; a dedicated thread drains
//! the underlying file descriptor into that buffer and wakes any waiting
//! consumer. Per the resolved Open Question in `spec.md` §9 (and recorded
//! in DESIGN.md), this follows the *newer* `base/pipe.c`'s semantics —
//! every read drains fully into the buffer before signalling, and
//! end-of-stream is reported only once the consumer has drained everything
//! already buffered — not the older, partial-read-losing variant.

use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

struct PipeBuffer {
    data: Vec<u8>,
    /// Offset into `data` up to which a consumer has already taken the
    /// "current" slice via [`ReadPipe::current`].
    consumed: usize,
    closed: bool,
}

struct Shared {
    buffer: Mutex<PipeBuffer>,
    condition: Condvar,
}

/// The parent-readable end of a pipe connected to a child's stdout or
/// stderr, plus the background thread draining it.
pub struct ReadPipe {
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,
}

impl ReadPipe {
    /// Spawns a thread that blocks on `source` (typically a `ChildStdout`/
    /// `ChildStderr`) and drains every read into the shared buffer before
    /// waking any waiter — see the module doc for why this never loses a
    /// chunk, unlike the original's older `process.c` variant.
    pub fn spawn<R: Read + Send + 'static>(mut source: R) -> Self {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(PipeBuffer { data: Vec::new(), consumed: 0, closed: false }),
            condition: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);
        let reader = std::thread::spawn(move || {
            let mut chunk = [0u8; 64 * 1024];
            loop {
                match source.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut buf = thread_shared.buffer.lock().expect("pipe buffer mutex poisoned");
                        buf.data.extend_from_slice(&chunk[..n]);
                        drop(buf);
                        thread_shared.condition.notify_all();
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log::warn!("read pipe error: {e}");
                        break;
                    }
                }
            }
            let mut buf = thread_shared.buffer.lock().expect("pipe buffer mutex poisoned");
            buf.closed = true;
            drop(buf);
            thread_shared.condition.notify_all();
        });
        ReadPipe { shared, reader: Some(reader) }
    }

    /// Blocks until unseen bytes are available or the pipe closes.
    /// Returns `false` only when the pipe closed with nothing left
    /// unconsumed — mirroring `read_pipe_expect`'s end-of-stream signal.
    pub fn expect(&self) -> bool {
        let mut buf = self.shared.buffer.lock().expect("pipe buffer mutex poisoned");
        loop {
            if buf.consumed < buf.data.len() {
                return true;
            }
            if buf.closed {
                return false;
            }
            buf = self.shared.condition.wait(buf).expect("condvar wait poisoned");
        }
    }

    /// Takes and clears the slice of bytes not yet handed to a previous
    /// call, without blocking.
    pub fn current(&self) -> Vec<u8> {
        let mut buf = self.shared.buffer.lock().expect("pipe buffer mutex poisoned");
        let slice = buf.data[buf.consumed..].to_vec();
        buf.consumed = buf.data.len();
        slice
    }

    /// `true` once the underlying descriptor has hit EOF and every byte
    /// has been handed to a consumer.
    pub fn is_exhausted(&self) -> bool {
        let buf = self.shared.buffer.lock().expect("pipe buffer mutex poisoned");
        buf.closed && buf.consumed >= buf.data.len()
    }

    /// Blocks until the reader thread observes EOF, returning every byte
    /// ever received (ignoring what `current` may have already drained).
    pub fn join_and_collect_all(mut self) -> Vec<u8> {
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        let buf = self.shared.buffer.lock().expect("pipe buffer mutex poisoned");
        buf.data.clone()
    }
}

impl Drop for ReadPipe {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

/// The parent-writable end of a pipe connected to a child's stdin.
pub struct WritePipe<W: Write> {
    sink: W,
}

impl<W: Write> WritePipe<W> {
    pub fn new(sink: W) -> Self {
        WritePipe { sink }
    }

    /// Writes the whole buffer, retrying on `Interrupted` the way the
    /// original's `write_pipe_write_chars` retry loop does — `Write::write_all`
    /// already retries `Interrupted` internally, so this is a thin,
    /// documented pass-through rather than a hand-rolled retry loop.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.sink.write_all(data)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
