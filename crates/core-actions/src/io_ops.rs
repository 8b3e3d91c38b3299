//! File collaborator: loading and saving buffers.
//!
//! The session only sees [`FileStore`]. [`FsStore`] talks to the filesystem
//! and keeps anything saved to stdout until the terminal has been restored;
//! [`MemoryStore`] backs tests. Failures are tagged [`FileError`]s and are
//! never retried.

use core_state::{Document, FileTarget, split_document};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("\"{0}\" No such file or directory")]
    NotFound(String),
    #[error("\"{0}\" Permission denied")]
    PermissionDenied(String),
    #[error("\"{0}\" is not valid UTF-8")]
    Encoding(String),
    #[error("\"{path}\" {message}")]
    Io { path: String, message: String },
}

impl FileError {
    fn from_io(path: &str, e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_string()),
            io::ErrorKind::InvalidData => FileError::Encoding(path.to_string()),
            _ => FileError::Io {
                path: path.to_string(),
                message: e.to_string(),
            },
        }
    }
}

pub trait FileStore {
    fn load(&mut self, target: &FileTarget) -> Result<Document, FileError>;
    /// Write `text` verbatim (line endings already applied).
    fn save(&mut self, target: &FileTarget, text: &str) -> Result<(), FileError>;
    fn exists(&self, path: &Path) -> bool;
}

/// Filesystem store. Stdin text is read up front by the caller; a save to
/// stdout replaces the pending payload (last save wins).
#[derive(Debug, Default)]
pub struct FsStore {
    stdin_text: Option<String>,
    stdout_payload: Option<String>,
}

impl FsStore {
    pub fn new(stdin_text: Option<String>) -> Self {
        Self {
            stdin_text,
            stdout_payload: None,
        }
    }

    /// What should go to stdout once the screen is gone.
    pub fn take_stdout_payload(&mut self) -> Option<String> {
        self.stdout_payload.take()
    }
}

impl FileStore for FsStore {
    fn load(&mut self, target: &FileTarget) -> Result<Document, FileError> {
        match target {
            FileTarget::Stdio => Ok(split_document(self.stdin_text.as_deref().unwrap_or(""))),
            FileTarget::Path(path) => {
                let name = path.display().to_string();
                let content = std::fs::read_to_string(path).map_err(|e| {
                    error!(target: "io", path = %name, error = %e, "file_open_error");
                    FileError::from_io(&name, &e)
                })?;
                let doc = split_document(&content);
                debug!(target: "io", path = %name, lines = doc.lines.len(), mixed = doc.mixed, "file_loaded");
                Ok(doc)
            }
        }
    }

    fn save(&mut self, target: &FileTarget, text: &str) -> Result<(), FileError> {
        match target {
            FileTarget::Stdio => {
                self.stdout_payload = Some(text.to_string());
                debug!(target: "io", bytes = text.len(), "stdout_payload_set");
                Ok(())
            }
            FileTarget::Path(path) => {
                let name = path.display().to_string();
                std::fs::write(path, text.as_bytes()).map_err(|e| {
                    error!(target: "io", path = %name, error = %e, "file_write_error");
                    FileError::from_io(&name, &e)
                })?;
                debug!(target: "io", path = %name, bytes = text.len(), "file_written");
                Ok(())
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory store for tests and scripted sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub files: HashMap<PathBuf, String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    /// Paths whose loads and saves fail with the given error.
    pub failures: HashMap<PathBuf, FileError>,
}

impl MemoryStore {
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl FileStore for MemoryStore {
    fn load(&mut self, target: &FileTarget) -> Result<Document, FileError> {
        match target {
            FileTarget::Stdio => Ok(split_document(self.stdin.as_deref().unwrap_or(""))),
            FileTarget::Path(path) => {
                if let Some(e) = self.failures.get(path) {
                    return Err(e.clone());
                }
                self.files
                    .get(path)
                    .map(|text| split_document(text))
                    .ok_or_else(|| FileError::NotFound(path.display().to_string()))
            }
        }
    }

    fn save(&mut self, target: &FileTarget, text: &str) -> Result<(), FileError> {
        match target {
            FileTarget::Stdio => {
                self.stdout = Some(text.to_string());
                Ok(())
            }
            FileTarget::Path(path) => {
                if let Some(e) = self.failures.get(path) {
                    return Err(e.clone());
                }
                self.files.insert(path.clone(), text.to_string());
                Ok(())
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::LineEnding;

    #[test]
    fn load_detects_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, "line1\r\nline2\nline3\r\n").unwrap();
        let mut store = FsStore::default();
        let doc = store.load(&FileTarget::Path(path)).unwrap();
        assert_eq!(doc.lines, vec!["line1", "line2", "line3"]);
        assert_eq!(doc.line_ending, LineEnding::Crlf);
        assert!(doc.mixed);
        assert!(doc.had_trailing_newline);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let mut store = FsStore::default();
        let err = store.load(&FileTarget::Path(path)).unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.dat");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let mut store = FsStore::default();
        let err = store.load(&FileTarget::Path(path)).unwrap_err();
        assert!(matches!(err, FileError::Encoding(_)));
    }

    #[test]
    fn save_writes_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut store = FsStore::default();
        store.save(&FileTarget::Path(path.clone()), "a\r\nb\r\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\r\nb\r\n");
        assert!(store.exists(&path));
    }

    #[test]
    fn stdout_payload_last_save_wins() {
        let mut store = FsStore::new(Some("in\n".into()));
        let doc = store.load(&FileTarget::Stdio).unwrap();
        assert_eq!(doc.lines, vec!["in"]);
        store.save(&FileTarget::Stdio, "one\n").unwrap();
        store.save(&FileTarget::Stdio, "two\n").unwrap();
        assert_eq!(store.take_stdout_payload().as_deref(), Some("two\n"));
        assert_eq!(store.take_stdout_payload(), None);
    }
}
