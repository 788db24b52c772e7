//! Exact content hashing with SHA-256.

use super::{ExactDigest, FailureDisposition, Fingerprint, FingerprintStrategy, GroupingMode};
use crate::error::FingerprintError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read block size used while streaming a file through the hasher
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Byte-identity strategy for audio, documents and anything else without
/// a perceptual representation.
///
/// Two files with identical bytes always get the same digest regardless of
/// name or location.
#[derive(Debug, Clone, Default)]
pub struct ExactHasher;

impl ExactHasher {
    pub fn new() -> Self {
        Self
    }

    /// SHA-256 of the full file content
    pub fn digest(&self, path: &Path) -> Result<ExactDigest, FingerprintError> {
        let io_failure = |source| FingerprintError::IoFailure {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_failure)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; BLOCK_SIZE];
        let mut total = 0u64;

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_failure(e)),
            };
            hasher.update(&buffer[..read]);
            total += read as u64;
        }

        if total == 0 {
            return Err(FingerprintError::EmptyContent {
                path: path.to_path_buf(),
            });
        }

        Ok(ExactDigest::new(hasher.finalize().into()))
    }
}

impl FingerprintStrategy for ExactHasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        self.digest(path).map(Fingerprint::Exact)
    }

    fn grouping(&self) -> GroupingMode {
        GroupingMode::Exact { by_extension: true }
    }

    fn failure_disposition(&self) -> FailureDisposition {
        FailureDisposition::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn identical_bytes_give_identical_digest() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.mp3", b"same audio payload");
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        let b = nested.join("renamed.mp3");
        fs::write(&b, b"same audio payload").unwrap();

        let hasher = ExactHasher::new();
        assert_eq!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());
    }

    #[test]
    fn one_changed_byte_changes_digest() {
        let dir = TempDir::new().unwrap();
        let mut content = vec![7u8; BLOCK_SIZE * 2 + 13];
        let a = write(&dir, "a.bin", &content);
        content[BLOCK_SIZE + 5] = 8;
        let b = write(&dir, "b.bin", &content);

        let hasher = ExactHasher::new();
        assert_ne!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());
    }

    #[test]
    fn known_digest_of_abc() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "abc.txt", b"abc");
        assert_eq!(
            ExactHasher::new().digest(&path).unwrap().to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_file_has_no_content() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.pdf", b"");
        assert!(matches!(
            ExactHasher::new().fingerprint(&path),
            Err(FingerprintError::EmptyContent { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_failure() {
        let result = ExactHasher::new().fingerprint(Path::new("/nonexistent/song.mp3"));
        assert!(matches!(result, Err(FingerprintError::IoFailure { .. })));
    }
}
