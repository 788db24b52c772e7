//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ExtensionFilter};
use super::{FileRecord, MediaCategory, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Directories never descended into (typically the destination)
    pub excluded_dirs: Vec<PathBuf>,
}

/// Scanner implementation using the walkdir crate.
///
/// Entries are visited in file-name order so repeated runs over the same
/// tree produce the same file sequence.
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ExtensionFilter,
    excluded_canonical: Vec<PathBuf>,
}

impl WalkDirScanner {
    /// Create a scanner accepting the given extensions
    pub fn new<I, S>(config: ScanConfig, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = ExtensionFilter::new(extensions).with_hidden(config.include_hidden);
        let excluded_canonical = config
            .excluded_dirs
            .iter()
            .filter_map(|dir| fs::canonicalize(dir).ok())
            .collect();

        Self {
            config,
            filter,
            excluded_canonical,
        }
    }

    /// Scan a directory tree without progress reporting
    pub fn scan(&self, root: &Path, category: MediaCategory) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, category, &crate::events::null_sender())
    }

    /// Scan a directory tree, reporting found files and errors as events
    pub fn scan_with_events(
        &self,
        root: &Path,
        category: MediaCategory,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_prune(entry));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), "{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            if entry.file_type().is_dir() || !self.filter.should_include(entry.path()) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    let path = entry.path().to_path_buf();
                    debug!(path = %path.display(), size = metadata.len(), "found file");
                    events.send(Event::Scan(ScanEvent::FileFound { path: path.clone() }));
                    files.push(FileRecord::new(path, metadata.len(), category));
                }
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: entry.path().to_path_buf(),
                        source: std::io::Error::other(e.to_string()),
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: entry.path().to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        Ok(ScanResult { files, errors })
    }

    /// Whether a directory entry (and everything below it) is skipped
    fn should_prune(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }

        if !self.config.include_hidden && is_hidden(entry.path()) {
            return true;
        }

        if self
            .config
            .excluded_dirs
            .iter()
            .any(|dir| entry.path() == dir.as_path())
        {
            return true;
        }

        !self.excluded_canonical.is_empty()
            && fs::canonicalize(entry.path())
                .map(|c| self.excluded_canonical.contains(&c))
                .unwrap_or(false)
    }
}
