//! # Fingerprint Module
//!
//! Turns a file into a comparable fingerprint, one strategy per media
//! category.
//!
//! ## Strategies
//! - **Exact content hash** (audio, documents, other) - SHA-256 of the bytes
//! - **Perceptual image hash** (images) - one or more of aHash, dHash, pHash
//! - **Frame-sampled video hash** (video) - frames decoded through an
//!   external backend, hashed and combined
//!
//! A strategy also reports how its fingerprints are grouped and what should
//! happen to files it cannot fingerprint.
//!
//! ## Example
//! ```rust,ignore
//! use doppelfiles::core::fingerprint::{StrategyConfig, HashAlgorithmKind};
//!
//! let strategy = StrategyConfig::new()
//!     .algorithms([HashAlgorithmKind::Average, HashAlgorithmKind::Perceptual])
//!     .build(MediaCategory::Image)?;
//!
//! let analysis = strategy.analyze(&record)?;
//! ```

pub mod algorithms;
mod exact;
pub mod fast_decode;
pub mod fast_resize;
mod photo;
mod traits;
pub mod video;

pub use exact::{ExactHasher, BLOCK_SIZE};
pub use photo::ImageStrategy;
pub use traits::{hasher_for, HashAlgorithm, HashAlgorithmKind, PerceptualCode, PerceptualHash};
pub use video::{
    sampling_interval, FfmpegBackend, FfmpegFlavor, VideoBackend, VideoHashMode, VideoInfo,
    VideoStrategy,
};

use crate::core::quality::QualitySignals;
use crate::core::scanner::{FileRecord, MediaCategory};
use crate::error::{DoppelError, FingerprintError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SHA-256 digest of a file's full content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExactDigest([u8; 32]);

impl ExactDigest {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// One perceptual code per configured algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualSignature {
    codes: Vec<PerceptualCode>,
}

impl PerceptualSignature {
    pub fn new(codes: Vec<PerceptualCode>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[PerceptualCode] {
        &self.codes
    }

    /// The code produced by a given algorithm, if it was computed
    pub fn code_for(&self, kind: HashAlgorithmKind) -> Option<&PerceptualCode> {
        self.codes.iter().find(|code| code.algorithm() == kind)
    }
}

/// Fingerprint of a video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoSignature {
    /// Average of the per-frame raw pixel hashes; compared for equality
    Aggregate(u64),
    /// Most frequent per-frame perceptual code; compared by distance
    Representative(PerceptualCode),
}

/// A comparable content fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fingerprint {
    Exact(ExactDigest),
    Perceptual(PerceptualSignature),
    Video(VideoSignature),
}

/// A fingerprint plus the metadata used to rank group members
#[derive(Debug, Clone)]
pub struct Analysis {
    pub fingerprint: Fingerprint,
    pub quality: QualitySignals,
}

/// How a strategy's fingerprints are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// Identical fingerprints, optionally also requiring the same extension
    Exact { by_extension: bool },
    /// First-fit clustering under a distance threshold
    Clustering,
}

/// What happens to a file that cannot be fingerprinted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// Leave the file where it is
    Skip,
    /// Move the file to the quarantine folder
    Quarantine,
}

/// A per-category fingerprinting strategy
pub trait FingerprintStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Compute the fingerprint of a file
    fn fingerprint(&self, path: &Path) -> std::result::Result<Fingerprint, FingerprintError>;

    /// Compute the fingerprint and the ranking signals of a file
    fn analyze(&self, record: &FileRecord) -> std::result::Result<Analysis, FingerprintError> {
        Ok(Analysis {
            fingerprint: self.fingerprint(&record.path)?,
            quality: QualitySignals::from_size(record.size),
        })
    }

    fn grouping(&self) -> GroupingMode;

    fn failure_disposition(&self) -> FailureDisposition;
}

/// Configuration builder for fingerprint strategies
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Image algorithms; all must agree for two images to match
    algorithms: Vec<HashAlgorithmKind>,
    /// Perceptual hash size (8 gives 64-bit codes)
    hash_size: u32,
    video_mode: VideoHashMode,
    /// Frame failures tolerated per video
    frame_error_limit: usize,
}

impl StrategyConfig {
    pub fn new() -> Self {
        Self {
            algorithms: vec![HashAlgorithmKind::Average],
            hash_size: 8,
            video_mode: VideoHashMode::Aggregate,
            frame_error_limit: 3,
        }
    }

    /// Use a single image algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithms = vec![algorithm];
        self
    }

    /// Use several image algorithms at once
    pub fn algorithms(mut self, algorithms: impl IntoIterator<Item = HashAlgorithmKind>) -> Self {
        let mut unique = Vec::new();
        for algorithm in algorithms {
            if !unique.contains(&algorithm) {
                unique.push(algorithm);
            }
        }
        self.algorithms = unique;
        self
    }

    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    pub fn video_mode(mut self, mode: VideoHashMode) -> Self {
        self.video_mode = mode;
        self
    }

    pub fn frame_error_limit(mut self, limit: usize) -> Self {
        self.frame_error_limit = limit;
        self
    }

    pub fn video_hash_mode(&self) -> VideoHashMode {
        self.video_mode
    }

    /// Build the strategy for a media category
    pub fn build(&self, category: MediaCategory) -> Result<Box<dyn FingerprintStrategy>> {
        if self.hash_size == 0 {
            return Err(DoppelError::Config("hash size must be positive".to_string()));
        }

        match category {
            MediaCategory::Audio | MediaCategory::Document | MediaCategory::Other => {
                Ok(Box::new(ExactHasher::new()))
            }
            MediaCategory::Image => {
                if self.algorithms.is_empty() {
                    return Err(DoppelError::Config(
                        "at least one image hash algorithm is required".to_string(),
                    ));
                }
                Ok(Box::new(ImageStrategy::new(&self.algorithms, self.hash_size)))
            }
            MediaCategory::Video => Ok(Box::new(
                VideoStrategy::new(self.video_mode)
                    .frame_error_limit(self.frame_error_limit)
                    .hash_size(self.hash_size),
            )),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::new()
    }
}
