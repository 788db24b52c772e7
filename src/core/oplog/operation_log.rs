//! Append-only record of every file move.

use crate::error::{LogError, UndoError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Separator between the original and destination path on one line
pub const SEPARATOR: char = '|';

/// Whether `path` survives a round trip through one log line: valid UTF-8
/// with no separator and no line break
pub fn is_recordable(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| !s.contains([SEPARATOR, '\n', '\r']))
}

/// One recorded move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLogEntry {
    pub original: PathBuf,
    pub destination: PathBuf,
}

impl OperationLogEntry {
    pub fn new(original: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            original: original.into(),
            destination: destination.into(),
        }
    }

    /// Parse an `<original>|<destination>` line (`line_number` is 1-based)
    pub fn parse(line_number: usize, line: &str) -> Result<Self, UndoError> {
        match line.split_once(SEPARATOR) {
            Some((original, destination)) if !original.is_empty() && !destination.is_empty() => {
                Ok(Self::new(original, destination))
            }
            _ => Err(UndoError::MalformedEntry {
                line_number,
                line: line.to_string(),
            }),
        }
    }

    pub(crate) fn to_line(&self) -> String {
        format!(
            "{}{}{}",
            self.original.to_string_lossy(),
            SEPARATOR,
            self.destination.to_string_lossy()
        )
    }
}

/// Text file with one `<original>|<destination>` line per move.
///
/// Each append opens the file, writes one line and syncs it to disk before
/// returning, so a crash never loses a move that already happened. The log
/// survives across runs until it is undone.
#[derive(Debug, Clone)]
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a completed move
    pub fn append(&self, original: &Path, destination: &Path) -> Result<(), LogError> {
        let line = OperationLogEntry::new(original, destination).to_line();
        append_line(&self.path, &line)
    }

    /// All lines in write order; unparsable lines are returned as errors.
    /// A missing log has no entries.
    pub fn entries(&self) -> Result<Vec<Result<OperationLogEntry, UndoError>>, LogError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LogError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| OperationLogEntry::parse(i + 1, line))
            .collect())
    }

    /// Whether there is anything to undo
    pub fn is_empty(&self) -> Result<bool, LogError> {
        Ok(self.entries()?.is_empty())
    }

    /// Replace the log with `lines`, or delete it when there are none.
    ///
    /// The new content is written beside the log and renamed over it, so a
    /// crash leaves either the old or the new log.
    pub fn rewrite(&self, lines: &[String]) -> Result<(), LogError> {
        if lines.is_empty() {
            return self.clear();
        }

        let write_error = |source| LogError::Write {
            path: self.path.clone(),
            source,
        };
        let staging = self.path.with_extension("log.tmp");
        let mut file = fs::File::create(&staging).map_err(write_error)?;
        for line in lines {
            writeln!(file, "{}", line).map_err(write_error)?;
        }
        file.sync_all().map_err(write_error)?;
        fs::rename(&staging, &self.path).map_err(write_error)
    }

    /// Delete the log file
    pub fn clear(&self) -> Result<(), LogError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LogError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Open in append mode, write one line, sync, close
pub(super) fn append_line(path: &Path, line: &str) -> Result<(), LogError> {
    let write_error = |source| LogError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;
    writeln!(file, "{}", line).map_err(write_error)?;
    file.sync_all().map_err(write_error)
}
