//! The persisted UI state blob (spec.md §6): "a tiny binary state blob
//! (monitor index and similar UI settings)" written to `$HOME/.eddy/state`.
//! Not part of the compiler core; kept here purely so this entry point has
//! somewhere to remember which monitor and window size it last ran on.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: u32 = 0xE1DD_0001;

/// Monitor index and last known window dimensions. Encoded as four
/// little-endian `u32`s rather than through a serialization crate — the
/// blob is fixed-shape and small enough that a format version tag plus
/// `to_le_bytes`/`from_le_bytes` is the whole format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedState {
    pub monitor_index: u32,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState { monitor_index: 0, window_width: 80, window_height: 24 }
    }
}

impl PersistedState {
    /// `$HOME/.eddy/state`, or `None` if `$HOME` isn't set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".eddy").join("state"))
    }

    /// Loads state from `path`, falling back to [`Default::default`] if the
    /// file doesn't exist yet (a fresh install has no prior session to
    /// restore).
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e),
        };
        Self::decode(&bytes)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(&self.encode())
    }

    fn encode(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&self.monitor_index.to_le_bytes());
        buf[8..12].copy_from_slice(&self.window_width.to_le_bytes());
        buf[12..16].copy_from_slice(&self.window_height.to_le_bytes());
        buf
    }

    fn decode(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() != 16 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "eddy state blob has the wrong length"));
        }
        let mut reader = bytes;
        let mut word = [0u8; 4];

        reader.read_exact(&mut word)?;
        let magic = u32::from_le_bytes(word);
        if magic != MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "eddy state blob has an unrecognised magic number"));
        }

        reader.read_exact(&mut word)?;
        let monitor_index = u32::from_le_bytes(word);
        reader.read_exact(&mut word)?;
        let window_width = u32::from_le_bytes(word);
        reader.read_exact(&mut word)?;
        let window_height = u32::from_le_bytes(word);

        Ok(PersistedState { monitor_index, window_width, window_height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let state = PersistedState { monitor_index: 2, window_width: 120, window_height: 40 };
        state.save(&path).unwrap();
        let loaded = PersistedState::load(&path).unwrap();
        assert_eq!(state, loaded);
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        let loaded = PersistedState::load(&path).unwrap();
        assert_eq!(loaded, PersistedState::default());
    }

    #[test]
    fn rejects_a_truncated_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        fs::write(&path, b"short").unwrap();
        assert!(PersistedState::load(&path).is_err());
    }
}
