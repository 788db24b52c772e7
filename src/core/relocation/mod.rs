//! # Relocation Module
//!
//! Moves non-canonical group members out of the scanned tree into a
//! destination folder:
//!
//! ```text
//! <destination>/
//!     photo.jpg          duplicates
//!     photo_1.jpg        name collisions get a numeric suffix
//!     thumbnails/        small image variants
//!     problematic/       files that could not be moved or fingerprinted
//! ```
//!
//! Moves that hit a transient error (permission denied, would block,
//! interrupted) are retried a fixed number of times with a fixed delay.

mod executor;
mod mover;
mod naming;

pub use executor::RelocationExecutor;
pub use mover::{FileMover, StdMover};
pub use naming::unique_destination;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Retry and folder layout settings
#[derive(Debug, Clone)]
pub struct RelocationConfig {
    /// Attempts per move before giving up, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Subfolder of the destination for thumbnail variants
    pub thumbnails_dir: String,
    /// Subfolder of the destination for quarantined files
    pub quarantine_dir: String,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            thumbnails_dir: "thumbnails".to_string(),
            quarantine_dir: "problematic".to_string(),
        }
    }
}

/// A completed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocatedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A file that could not be moved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of relocating one or more groups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelocationReport {
    /// Canonical members left in place
    pub kept: Vec<PathBuf>,
    /// Duplicates and thumbnails moved to the destination
    pub relocated: Vec<RelocatedFile>,
    /// Files moved to the quarantine folder
    pub quarantined: Vec<RelocatedFile>,
    /// Every failure, including ones later resolved by quarantine
    pub errors: Vec<RelocationFailure>,
    /// Number of extra attempts spent on transient errors
    pub retries: u32,
}

impl RelocationReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: RelocationReport) {
        self.kept.extend(other.kept);
        self.relocated.extend(other.relocated);
        self.quarantined.extend(other.quarantined);
        self.errors.extend(other.errors);
        self.retries += other.retries;
    }

    /// Total number of files moved anywhere
    pub fn moved_count(&self) -> usize {
        self.relocated.len() + self.quarantined.len()
    }
}
