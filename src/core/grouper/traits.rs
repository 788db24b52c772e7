//! Comparison strategies for fingerprints.

use super::MatchType;
use crate::core::fingerprint::{
    Fingerprint, HashAlgorithmKind, PerceptualCode, PerceptualHash, VideoSignature,
};

/// Strategy deciding whether two fingerprints belong to the same group
pub trait ComparisonStrategy: Send + Sync {
    /// Distance between two fingerprints if they match, `None` otherwise
    fn compare(&self, a: &Fingerprint, b: &Fingerprint) -> Option<u32>;

    /// Whether two fingerprints match
    fn is_duplicate(&self, a: &Fingerprint, b: &Fingerprint) -> bool {
        self.compare(a, b).is_some()
    }

    /// Classify a group by its largest member distance
    fn classify(&self, distance: u32) -> MatchType {
        MatchType::from_distance(distance)
    }

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Maximum Hamming distance per code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarityThresholds {
    pub average: u32,
    pub difference: u32,
    pub perceptual: u32,
    /// Representative frame codes in majority-vote video mode
    pub video: u32,
}

impl SimilarityThresholds {
    /// The same threshold for every code type
    pub fn uniform(threshold: u32) -> Self {
        Self {
            average: threshold,
            difference: threshold,
            perceptual: threshold,
            video: threshold,
        }
    }

    pub fn for_algorithm(&self, kind: HashAlgorithmKind) -> u32 {
        match kind {
            HashAlgorithmKind::Average => self.average,
            HashAlgorithmKind::Difference => self.difference,
            HashAlgorithmKind::Perceptual => self.perceptual,
        }
    }
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            average: 5,
            difference: 8,
            perceptual: 8,
            video: 5,
        }
    }
}

/// Threshold-based comparison strategy.
///
/// Exact digests and aggregate video signatures match only when identical.
/// Perceptual signatures match when every code is within its algorithm's
/// threshold; the reported distance is the largest code distance.
#[derive(Debug, Clone, Default)]
pub struct ThresholdStrategy {
    thresholds: SimilarityThresholds,
}

impl ThresholdStrategy {
    pub fn new(thresholds: SimilarityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &SimilarityThresholds {
        &self.thresholds
    }

    fn within(code_a: &PerceptualCode, code_b: &PerceptualCode, threshold: u32) -> Option<u32> {
        if code_a.algorithm() != code_b.algorithm() {
            return None;
        }
        let distance = code_a.distance(code_b);
        (distance <= threshold).then_some(distance)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn compare(&self, a: &Fingerprint, b: &Fingerprint) -> Option<u32> {
        match (a, b) {
            (Fingerprint::Exact(x), Fingerprint::Exact(y)) => (x == y).then_some(0),
            (Fingerprint::Perceptual(x), Fingerprint::Perceptual(y)) => {
                if x.codes().is_empty() || x.codes().len() != y.codes().len() {
                    return None;
                }
                x.codes()
                    .iter()
                    .zip(y.codes())
                    .map(|(ca, cb)| {
                        Self::within(ca, cb, self.thresholds.for_algorithm(ca.algorithm()))
                    })
                    .try_fold(0, |max, distance| distance.map(|d| max.max(d)))
            }
            (
                Fingerprint::Video(VideoSignature::Aggregate(x)),
                Fingerprint::Video(VideoSignature::Aggregate(y)),
            ) => (x == y).then_some(0),
            (
                Fingerprint::Video(VideoSignature::Representative(x)),
                Fingerprint::Video(VideoSignature::Representative(y)),
            ) => Self::within(x, y, self.thresholds.video),
            _ => None,
        }
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: aHash <= {}, dHash <= {}, pHash <= {}, video <= {}",
            self.thresholds.average,
            self.thresholds.difference,
            self.thresholds.perceptual,
            self.thresholds.video
        )
    }
}
