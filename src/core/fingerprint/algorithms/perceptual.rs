//! Perceptual Hash (pHash) implementation.
//!
//! Applies a DCT before thresholding so the code captures the lowest
//! frequencies of the image. More robust to scaling, brightness changes
//! and compression artifacts than aHash, at a higher cost.
//!
//! Delegates to the image_hasher crate's DCT-preprocessed mean hash.

use super::super::traits::{HashAlgorithm, HashAlgorithmKind, PerceptualCode};
use crate::error::FingerprintError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hasher }
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualCode, FingerprintError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FingerprintError::ComputationFailed(
                "cannot hash an empty image".to_string(),
            ));
        }

        let hash = self.hasher.hash_image(image);
        Ok(PerceptualCode::new(
            hash.as_bytes().to_vec(),
            HashAlgorithmKind::Perceptual,
        ))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }
}
