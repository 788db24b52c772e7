//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Converting to grayscale and resizing to hash_size x hash_size
//! 2. Computing the mean brightness
//! 3. For each pixel: if brighter than the mean, set bit to 1, else 0
//!
//! Cheap and tolerant of re-encoding and scaling, but sensitive to
//! gradient and color edits.

use super::super::traits::{pack_bits, HashAlgorithm, HashAlgorithmKind, PerceptualCode};
use crate::error::FingerprintError;
use image::imageops::FilterType;
use image::DynamicImage;

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    hash_size: u32,
}

impl AverageHasher {
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualCode, FingerprintError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FingerprintError::ComputationFailed(
                "cannot hash an empty image".to_string(),
            ));
        }

        let gray = image
            .grayscale()
            .resize_exact(self.hash_size, self.hash_size, FilterType::Triangle)
            .to_luma8();

        let count = gray.pixels().len() as f64;
        let mean = gray.pixels().map(|p| p[0] as f64).sum::<f64>() / count;

        let bytes = pack_bits(gray.pixels().map(|p| p[0] as f64 > mean));
        Ok(PerceptualCode::new(bytes, HashAlgorithmKind::Average))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Average
    }
}
