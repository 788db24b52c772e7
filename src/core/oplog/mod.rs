//! # Operation Log Module
//!
//! Durable text logs written during a run.
//!
//! - **Operation log** - `<original>|<destination>` per move, read back by undo
//! - **Error log** - `<path>: <message>` per failed file
//!
//! Every line is synced to disk before the call that wrote it returns.

mod error_log;
mod operation_log;

pub use error_log::ErrorLog;
pub use operation_log::{is_recordable, OperationLog, OperationLogEntry, SEPARATOR};

use crate::error::LogError;
use std::fs;
use std::path::PathBuf;

/// Where the logs live
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding both logs
    pub dir: PathBuf,
    /// File name of the operation log
    pub operation_log: String,
    /// File name of the error log
    pub error_log: String,
}

impl LogConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn operation_log_path(&self) -> PathBuf {
        self.dir.join(&self.operation_log)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(&self.error_log)
    }

    /// Create the log directory and hand out both logs
    pub fn open(&self) -> Result<(OperationLog, ErrorLog), LogError> {
        fs::create_dir_all(&self.dir).map_err(|source| LogError::CreateDirectory {
            path: self.dir.clone(),
            source,
        })?;

        Ok((
            OperationLog::new(self.operation_log_path()),
            ErrorLog::new(self.error_log_path()),
        ))
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            operation_log: "operations.log".to_string(),
            error_log: "errors.log".to_string(),
        }
    }
}

/// Per-user data directory for the logs, falling back to the working directory
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("doppelfiles"))
        .unwrap_or_else(|| PathBuf::from(".doppelfiles"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_file_names() {
        let config = LogConfig::new("/var/lib/doppel");
        assert_eq!(
            config.operation_log_path(),
            PathBuf::from("/var/lib/doppel/operations.log")
        );
        assert_eq!(config.error_log_path(), PathBuf::from("/var/lib/doppel/errors.log"));
    }

    #[test]
    fn open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let config = LogConfig::new(dir.path().join("nested").join("logs"));

        let (operations, errors) = config.open().unwrap();
        assert!(config.dir.is_dir());
        assert!(operations.path().starts_with(&config.dir));
        assert!(errors.path().starts_with(&config.dir));
    }

    #[test]
    fn open_fails_when_directory_cannot_be_created() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a dir").unwrap();

        let result = LogConfig::new(blocker.join("logs")).open();
        assert!(matches!(result, Err(LogError::CreateDirectory { .. })));
    }
}
