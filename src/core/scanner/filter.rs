//! File filtering logic for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Accepts files whose extension is in a caller-supplied set
pub struct ExtensionFilter {
    /// Lower-cased extensions without the leading dot
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Create a filter from extensions such as `"mp3"` or `".MP3"`
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_case_insensitively() {
        let filter = ExtensionFilter::new(["mp3", "flac"]);
        assert!(filter.should_include(Path::new("/music/song.mp3")));
        assert!(filter.should_include(Path::new("/music/song.FLAC")));
    }

    #[test]
    fn filter_accepts_dotted_extensions() {
        let filter = ExtensionFilter::new([".pdf", ".DOCX"]);
        assert!(filter.should_include(Path::new("/docs/a.pdf")));
        assert!(filter.should_include(Path::new("/docs/b.docx")));
    }

    #[test]
    fn filter_excludes_other_extensions() {
        let filter = ExtensionFilter::new(["mp3"]);
        assert!(!filter.should_include(Path::new("/music/song.wav")));
        assert!(!filter.should_include(Path::new("/music/no_extension")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = ExtensionFilter::new(["jpg"]);
        assert!(!filter.should_include(Path::new("/photos/.hidden.jpg")));
        assert!(filter
            .with_hidden(true)
            .should_include(Path::new("/photos/.hidden.jpg")));
    }
}
