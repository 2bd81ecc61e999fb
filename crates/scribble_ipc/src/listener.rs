//! Frontend-side socket: binds a UNIX-domain path and accepts the one
//! worker connection a compile makes. Spec.md §4.4: "There is no
//! persistent server; the frontend is the listener and the worker
//! connects once per compile."

use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use scribble_base::CompileError;

pub struct Listener {
    inner: UnixListener,
    path: PathBuf,
}

impl Listener {
    /// Binds `path`, removing a stale socket file left behind by a crashed
    /// previous run (`UnixListener::bind` otherwise fails with "address in
    /// use" against a dead socket).
    pub fn bind(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| CompileError::Io(e.to_string()))?;
        }
        let inner = UnixListener::bind(&path).map_err(|e| CompileError::Io(e.to_string()))?;
        Ok(Listener { inner, path })
    }

    /// Blocks for the worker's one connection for this compile.
    pub fn accept(&self) -> Result<UnixStream, CompileError> {
        let (stream, _addr) = self.inner.accept().map_err(|e| CompileError::Io(e.to_string()))?;
        Ok(stream)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_accept_one_worker_connection() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("scribble.sock");
        let listener = Listener::bind(&socket_path).unwrap();

        let connect_path = socket_path.clone();
        let worker_thread = std::thread::spawn(move || UnixStream::connect(connect_path).unwrap());

        let _server_end = listener.accept().unwrap();
        worker_thread.join().unwrap();
    }

    #[test]
    fn bind_removes_a_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("scribble.sock");
        std::fs::write(&socket_path, b"stale").unwrap();
        assert!(Listener::bind(&socket_path).is_ok());
    }

    #[test]
    fn drop_removes_the_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("scribble.sock");
        {
            let _listener = Listener::bind(&socket_path).unwrap();
            assert!(socket_path.exists());
        }
        assert!(!socket_path.exists());
    }
}
