//! Trait definitions for perceptual hashing.

use crate::error::FingerprintError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// A computed perceptual hash that can be compared
pub trait PerceptualHash: Clone + Send + Sync {
    /// Hamming distance to another hash; lower means more similar
    fn distance(&self, other: &Self) -> u32;

    /// Get the raw hash bytes
    fn as_bytes(&self) -> &[u8];

    /// Get the hash as a hexadecimal string
    fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Get the total number of bits in this hash
    fn bit_count(&self) -> u32 {
        (self.as_bytes().len() * 8) as u32
    }
}

/// Available perceptual hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithmKind {
    /// Average Hash (aHash) - brightness above/below the mean
    Average,
    /// Difference Hash (dHash) - horizontal brightness gradients
    Difference,
    /// Perceptual Hash (pHash) - low DCT frequencies
    Perceptual,
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Average => write!(f, "aHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a hash from an already-loaded image
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualCode, FingerprintError>;

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}

/// Build the hasher for an algorithm at the given hash size
pub fn hasher_for(kind: HashAlgorithmKind, hash_size: u32) -> Box<dyn HashAlgorithm> {
    use super::algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher};

    match kind {
        HashAlgorithmKind::Average => Box::new(AverageHasher::new(hash_size)),
        HashAlgorithmKind::Difference => Box::new(DifferenceHasher::new(hash_size)),
        HashAlgorithmKind::Perceptual => Box::new(PerceptualHasher::new(hash_size)),
    }
}

/// A single fixed-width perceptual code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualCode {
    bytes: Vec<u8>,
    algorithm: HashAlgorithmKind,
}

impl PerceptualCode {
    pub fn new(bytes: Vec<u8>, algorithm: HashAlgorithmKind) -> Self {
        Self { bytes, algorithm }
    }

    /// Get the algorithm that produced this code
    pub fn algorithm(&self) -> HashAlgorithmKind {
        self.algorithm
    }
}

impl PerceptualHash for PerceptualCode {
    fn distance(&self, other: &Self) -> u32 {
        let common: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();

        // Length mismatch counts every missing bit as different
        let extra = self.bytes.len().abs_diff(other.bytes.len()) as u32 * 8;
        common + extra
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Pack a row-major sequence of bits into bytes, most significant bit first
pub(crate) fn pack_bits(bits: impl Iterator<Item = bool>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut current: u8 = 0;
    let mut position = 0;

    for bit in bits {
        if bit {
            current |= 1 << (7 - position);
        }
        position += 1;
        if position == 8 {
            bytes.push(current);
            current = 0;
            position = 0;
        }
    }

    if position > 0 {
        bytes.push(current);
    }

    bytes
}
