//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size grayscale
//! 2. Comparing each pixel to the one to its right
//! 3. If the left pixel is brighter, set bit to 1, else 0
//!
//! Also used per sampled frame by the majority-vote video strategy.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{pack_bits, HashAlgorithm, HashAlgorithmKind, PerceptualCode};
use crate::error::FingerprintError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    hash_size: u32,
}

impl DifferenceHasher {
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualCode, FingerprintError> {
        // One extra column to compute differences
        let resized = resize_to_grayscale(image, self.hash_size + 1, self.hash_size)?;
        let gray = &resized;
        let size = self.hash_size;

        let bits = (0..size).flat_map(move |y| {
            (0..size).map(move |x| gray.get_pixel(x, y)[0] > gray.get_pixel(x + 1, y)[0])
        });

        Ok(PerceptualCode::new(pack_bits(bits), HashAlgorithmKind::Difference))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }
}
