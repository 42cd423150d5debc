//! Script file load/save.
//!
//! Scripts are plain UTF-8 text, one command per line. Loading and saving
//! never reformat: the bytes written are the bytes handed in, so a
//! save/load round trip is identity.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Tracks the file a script was loaded from so a plain "save" knows where to
/// write.
#[derive(Debug, Default)]
pub struct ScriptManager {
    current_file: Option<PathBuf>,
}

impl ScriptManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the most recently loaded or saved script, if any.
    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Read a script file verbatim.
    pub fn load(&mut self, path: impl AsRef<Path>) -> io::Result<String> {
        let path = path.as_ref();
        let script = fs::read_to_string(path)?;
        self.current_file = Some(path.to_owned());
        Ok(script)
    }

    /// Write a script file verbatim.
    pub fn save(&mut self, path: impl AsRef<Path>, script: &str) -> io::Result<()> {
        let path = path.as_ref();
        fs::write(path, script)?;
        self.current_file = Some(path.to_owned());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macro.txt");
        // Mixed blank lines, comments, and trailing whitespace must survive.
        let script = "var x 1\n\n# comment\nloop 3\n  log $x  \nendloop\n";

        let mut mgr = ScriptManager::new();
        mgr.save(&path, script).unwrap();
        let loaded = mgr.load(&path).unwrap();
        assert_eq!(loaded, script);
        assert_eq!(mgr.current_file(), Some(path.as_path()));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let mut mgr = ScriptManager::new();
        assert!(mgr.load("/no/such/automac/script.txt").is_err());
        assert_eq!(mgr.current_file(), None);
    }
}
