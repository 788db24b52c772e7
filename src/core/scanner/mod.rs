//! # Scanner Module
//!
//! Discovers candidate files in a directory tree.
//!
//! The scanner knows nothing about which extensions belong to which media
//! category; callers hand it an already-resolved extension set.
//!
//! ## Example
//! ```rust,ignore
//! use doppelfiles::core::scanner::{MediaCategory, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default(), &["mp3", "flac"]);
//! let result = scanner.scan(Path::new("/music"), MediaCategory::Audio)?;
//! ```

mod filter;
mod walker;

pub use filter::ExtensionFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Media category of a file; selects the fingerprint strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Audio,
    Image,
    Video,
    Document,
    Other,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Category the file was scanned under
    pub category: MediaCategory,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, size: u64, category: MediaCategory) -> Self {
        Self {
            path: path.into(),
            size,
            category,
        }
    }

    /// Lower-cased extension without the dot, empty if none
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

/// Lower-cased extension of a path without the dot, empty if none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Matching files in walk order
    pub files: Vec<FileRecord>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        let record = FileRecord::new("/music/Track.MP3", 10, MediaCategory::Audio);
        assert_eq!(record.extension(), "mp3");
    }

    #[test]
    fn missing_extension_is_empty() {
        let record = FileRecord::new("/docs/README", 10, MediaCategory::Document);
        assert_eq!(record.extension(), "");
    }

    #[test]
    fn category_display() {
        assert_eq!(MediaCategory::Video.to_string(), "video");
        assert_eq!(MediaCategory::Other.as_str(), "other");
    }
}
