//! Append-only record of per-file failures.

use super::operation_log::append_line;
use crate::error::LogError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Text file with one `<path>: <message>` line per failure
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failure for a file. Line breaks are escaped so every record
    /// stays on one line.
    pub fn record(&self, file: &Path, message: &str) -> Result<(), LogError> {
        warn!(path = %file.display(), "{}", message);
        let line = format!("{}: {}", file.to_string_lossy(), message)
            .replace('\n', "\\n")
            .replace('\r', "\\r");
        append_line(&self.path, &line)
    }

    /// Every recorded line, oldest first
    pub fn lines(&self) -> Result<Vec<String>, LogError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(LogError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
