//! # Error Module
//!
//! Error types for the duplicate file engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Isolate failures** - a single unreadable file never aborts a run
//! - **Fatal only when state can't be recorded** - missing log or
//!   destination directories are the only run-stopping errors

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DoppelError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Relocation error: {0}")]
    Relocation(#[from] RelocationError),

    #[error("Undo error: {0}")]
    Undo(#[from] UndoError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while discovering files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// The directory or entry this error refers to
    pub fn path(&self) -> &Path {
        match self {
            ScanError::DirectoryNotFound { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. } => path,
        }
    }

    /// What went wrong, without the path
    pub fn reason(&self) -> String {
        match self {
            ScanError::DirectoryNotFound { .. } => "directory not found".to_string(),
            ScanError::PermissionDenied { .. } => "permission denied".to_string(),
            ScanError::ReadDirectory { source, .. } => format!("read failed: {}", source),
        }
    }
}

/// Errors that occur while fingerprinting a single file.
///
/// A fingerprint failure excludes the file from grouping. Depending on the
/// media category the caller either skips it or moves it to quarantine.
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("File is empty or has no content: {path}")]
    EmptyContent { path: PathBuf },

    #[error("Could not open video {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("No decodable frames in {path}")]
    NoDecodableFrames { path: PathBuf },

    #[error("Too many frame errors in {path} ({failures} failures, limit {limit})")]
    TooManyFrameErrors {
        path: PathBuf,
        failures: usize,
        limit: usize,
    },

    #[error("Fingerprint computation failed: {0}")]
    ComputationFailed(String),
}

impl FingerprintError {
    /// The file this error refers to, when known
    pub fn path(&self) -> Option<&Path> {
        match self {
            FingerprintError::IoFailure { path, .. }
            | FingerprintError::DecodeFailed { path, .. }
            | FingerprintError::EmptyContent { path }
            | FingerprintError::OpenFailed { path, .. }
            | FingerprintError::NoDecodableFrames { path }
            | FingerprintError::TooManyFrameErrors { path, .. } => Some(path),
            FingerprintError::ComputationFailed(_) => None,
        }
    }

    /// What went wrong, without the path; this is what the error log records
    pub fn reason(&self) -> String {
        match self {
            FingerprintError::IoFailure { source, .. } => format!("read failed: {}", source),
            FingerprintError::DecodeFailed { reason, .. } => format!("decode failed: {}", reason),
            FingerprintError::EmptyContent { .. } => "file is empty".to_string(),
            FingerprintError::OpenFailed { reason, .. } => {
                format!("could not open video: {}", reason)
            }
            FingerprintError::NoDecodableFrames { .. } => "no decodable frames".to_string(),
            FingerprintError::TooManyFrameErrors {
                failures, limit, ..
            } => format!(
                "too many frame errors ({} failures, limit {})",
                failures, limit
            ),
            FingerprintError::ComputationFailed(reason) => {
                format!("fingerprint computation failed: {}", reason)
            }
        }
    }
}

/// Errors raised by an external video decoding backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected backend output: {0}")]
    InvalidOutput(String),
}

/// Errors that occur while moving a file out of its group
#[derive(Error, Debug)]
pub enum RelocationError {
    #[error("Gave up moving {path} after {attempts} attempts: {source}")]
    Transient {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {path}: {source}")]
    Permanent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to quarantine {path}: {source}")]
    QuarantineFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination directory {path} is unavailable: {source}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path cannot be written as one operation log line, so moving it
    /// would make the move impossible to undo
    #[error("Refusing to move {path}: {target} cannot be recorded in the operation log")]
    Unloggable { path: PathBuf, target: PathBuf },
}

impl RelocationError {
    /// The source file this error refers to
    pub fn path(&self) -> &Path {
        match self {
            RelocationError::Transient { path, .. }
            | RelocationError::Permanent { path, .. }
            | RelocationError::QuarantineFailed { path, .. }
            | RelocationError::DestinationUnavailable { path, .. }
            | RelocationError::Unloggable { path, .. } => path,
        }
    }

    /// What went wrong, without the source path
    pub fn reason(&self) -> String {
        match self {
            RelocationError::Transient {
                attempts, source, ..
            } => format!("gave up after {} attempts: {}", attempts, source),
            RelocationError::Permanent { source, .. } => format!("move failed: {}", source),
            RelocationError::QuarantineFailed { source, .. } => {
                format!("quarantine failed: {}", source)
            }
            RelocationError::DestinationUnavailable { source, .. } => {
                format!("destination directory unavailable: {}", source)
            }
            RelocationError::Unloggable { path, target } if path == target => {
                "not moved: the name is not valid UTF-8 or contains '|' or a line break"
                    .to_string()
            }
            RelocationError::Unloggable { target, .. } => format!(
                "not moved: {} is not valid UTF-8 or contains '|' or a line break",
                target.display()
            ),
        }
    }
}

/// Errors that occur while restoring a single logged move
#[derive(Error, Debug)]
pub enum UndoError {
    #[error("Failed to restore {destination} to {original}: {source}")]
    RestoreFailed {
        original: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot restore {destination}: {original} already exists")]
    TargetOccupied {
        original: PathBuf,
        destination: PathBuf,
    },

    #[error("Malformed operation log line {line_number}: {line:?}")]
    MalformedEntry { line_number: usize, line: String },
}

impl UndoError {
    /// What went wrong, without the destination path
    pub fn reason(&self) -> String {
        match self {
            UndoError::RestoreFailed {
                original, source, ..
            } => format!("could not restore to {}: {}", original.display(), source),
            UndoError::TargetOccupied { original, .. } => {
                format!("{} already exists", original.display())
            }
            UndoError::MalformedEntry { line_number, line } => {
                format!("malformed line {}: {:?}", line_number, line)
            }
        }
    }
}

/// Errors that occur with the operation and error logs.
///
/// These are fatal: the engine cannot proceed without a place to record state.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DoppelError>;
