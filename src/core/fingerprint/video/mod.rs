//! Frame-sampled video fingerprinting.
//!
//! A video is opened through the first backend that can probe it, every
//! n-th frame is decoded to grayscale, and the per-frame hashes are combined
//! into one signature. How often frames are sampled depends on the length of
//! the video.

mod backend;

pub use backend::{parse_probe_output, FfmpegBackend, FfmpegFlavor, VideoBackend, VideoInfo};

use super::algorithms::DifferenceHasher;
use super::traits::{HashAlgorithm, PerceptualCode};
use super::{
    Analysis, FailureDisposition, Fingerprint, FingerprintStrategy, GroupingMode, VideoSignature,
};
use crate::core::quality::QualitySignals;
use crate::core::scanner::FileRecord;
use crate::error::FingerprintError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

/// Sampling interval used when the length of a video is unknown
pub const DEFAULT_SAMPLING_INTERVAL: u64 = 30;

/// How per-frame hashes are combined into a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoHashMode {
    /// Average of raw-pixel frame hashes, grouped by equality
    #[default]
    Aggregate,
    /// Most frequent perceptual frame code, grouped by distance
    MajorityVote,
}

impl std::fmt::Display for VideoHashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoHashMode::Aggregate => write!(f, "aggregate"),
            VideoHashMode::MajorityVote => write!(f, "majority-vote"),
        }
    }
}

/// Frames between two samples: short videos are sampled densely, long
/// ones sparsely.
pub fn sampling_interval(info: &VideoInfo) -> u64 {
    match info.effective_duration() {
        Some(secs) if secs < 60.0 => 10,
        Some(secs) if secs < 300.0 => 30,
        Some(_) => 60,
        None => DEFAULT_SAMPLING_INTERVAL,
    }
}

/// Video fingerprinting over a chain of decoding backends
pub struct VideoStrategy {
    backends: Vec<Box<dyn VideoBackend>>,
    mode: VideoHashMode,
    frame_error_limit: usize,
    frame_hasher: DifferenceHasher,
}

/// Running combination of per-frame hashes
enum Accumulator {
    Aggregate { sum: u128, frames: u64 },
    Votes(Vec<(PerceptualCode, usize)>),
}

impl Accumulator {
    fn new(mode: VideoHashMode) -> Self {
        match mode {
            VideoHashMode::Aggregate => Accumulator::Aggregate { sum: 0, frames: 0 },
            VideoHashMode::MajorityVote => Accumulator::Votes(Vec::new()),
        }
    }

    fn add_raw(&mut self, hash: u64) {
        if let Accumulator::Aggregate { sum, frames } = self {
            *sum += hash as u128;
            *frames += 1;
        }
    }

    fn add_code(&mut self, code: PerceptualCode) {
        if let Accumulator::Votes(votes) = self {
            match votes.iter_mut().find(|(seen, _)| *seen == code) {
                Some((_, count)) => *count += 1,
                None => votes.push((code, 1)),
            }
        }
    }

    fn finish(self) -> Option<VideoSignature> {
        match self {
            Accumulator::Aggregate { frames: 0, .. } => None,
            Accumulator::Aggregate { sum, frames } => {
                Some(VideoSignature::Aggregate((sum / frames as u128) as u64))
            }
            Accumulator::Votes(votes) => {
                // Strictly greater keeps the first-seen code on ties
                let mut best: Option<(PerceptualCode, usize)> = None;
                for (code, count) in votes {
                    if best.as_ref().map_or(true, |(_, top)| count > *top) {
                        best = Some((code, count));
                    }
                }
                best.map(|(code, _)| VideoSignature::Representative(code))
            }
        }
    }
}

impl VideoStrategy {
    /// Strategy over the ffmpeg backend chain
    pub fn new(mode: VideoHashMode) -> Self {
        Self::with_backends(FfmpegBackend::chain(), mode)
    }

    /// Strategy over custom backends, tried in the given order
    pub fn with_backends(backends: Vec<Box<dyn VideoBackend>>, mode: VideoHashMode) -> Self {
        Self {
            backends,
            mode,
            frame_error_limit: 3,
            frame_hasher: DifferenceHasher::new(8),
        }
    }

    /// Frame failures tolerated before the whole video is rejected
    pub fn frame_error_limit(mut self, limit: usize) -> Self {
        self.frame_error_limit = limit;
        self
    }

    /// Size of the per-frame perceptual code in majority-vote mode
    pub fn hash_size(mut self, size: u32) -> Self {
        self.frame_hasher = DifferenceHasher::new(size);
        self
    }

    pub fn mode(&self) -> VideoHashMode {
        self.mode
    }

    /// Probe with each backend in order; the first one that opens the file
    /// is used for every frame. If none opens it, the first error is kept.
    fn open(&self, path: &Path) -> Result<(&dyn VideoBackend, VideoInfo), FingerprintError> {
        let mut first_error = None;

        for backend in &self.backends {
            match backend.probe(path) {
                Ok(info) => {
                    debug!(path = %path.display(), backend = backend.name(), ?info, "video opened");
                    return Ok((backend.as_ref(), info));
                }
                Err(e) => {
                    debug!(path = %path.display(), backend = backend.name(), error = %e, "backend could not open video");
                    first_error.get_or_insert(e);
                }
            }
        }

        Err(FingerprintError::OpenFailed {
            path: path.to_path_buf(),
            reason: first_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no video backend configured".to_string()),
        })
    }

    fn compute(&self, path: &Path) -> Result<(VideoSignature, VideoInfo), FingerprintError> {
        let (backend, info) = self.open(path)?;
        let no_frames = || FingerprintError::NoDecodableFrames {
            path: path.to_path_buf(),
        };

        let frame_count = info.frame_count.filter(|&n| n > 0).ok_or_else(no_frames)?;
        let interval = sampling_interval(&info);

        let mut accumulator = Accumulator::new(self.mode);
        let mut failures = 0usize;

        for index in (0..frame_count).step_by(interval as usize) {
            let result = backend
                .read_frame(path, &info, index)
                .map_err(|e| e.to_string())
                .and_then(|frame| match self.mode {
                    VideoHashMode::Aggregate => {
                        accumulator.add_raw(xxh3_64(frame.as_raw()));
                        Ok(())
                    }
                    VideoHashMode::MajorityVote => self
                        .frame_hasher
                        .hash_image(&DynamicImage::ImageLuma8(frame))
                        .map(|code| accumulator.add_code(code))
                        .map_err(|e| e.to_string()),
                });

            if let Err(message) = result {
                failures += 1;
                if failures > self.frame_error_limit {
                    return Err(FingerprintError::TooManyFrameErrors {
                        path: path.to_path_buf(),
                        failures,
                        limit: self.frame_error_limit,
                    });
                }
                warn!(path = %path.display(), frame = index, "skipping frame: {}", message);
            }
        }

        let signature = accumulator.finish().ok_or_else(no_frames)?;
        Ok((signature, info))
    }
}

impl FingerprintStrategy for VideoStrategy {
    fn name(&self) -> &'static str {
        "video-frames"
    }

    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        self.compute(path).map(|(signature, _)| Fingerprint::Video(signature))
    }

    fn analyze(&self, record: &FileRecord) -> Result<Analysis, FingerprintError> {
        let (signature, info) = self.compute(&record.path)?;

        let mut quality = QualitySignals::from_size(record.size);
        if info.width > 0 && info.height > 0 {
            quality = quality.with_dimensions(info.width, info.height);
        }
        if let Some(duration) = info.effective_duration() {
            quality = quality.with_duration(duration);
        }

        Ok(Analysis {
            fingerprint: Fingerprint::Video(signature),
            quality,
        })
    }

    fn grouping(&self) -> GroupingMode {
        match self.mode {
            VideoHashMode::Aggregate => GroupingMode::Exact {
                by_extension: false,
            },
            VideoHashMode::MajorityVote => GroupingMode::Clustering,
        }
    }

    fn failure_disposition(&self) -> FailureDisposition {
        FailureDisposition::Quarantine
    }
}
