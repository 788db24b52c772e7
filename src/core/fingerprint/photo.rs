//! Perceptual image fingerprinting.

use super::fast_decode::FastDecoder;
use super::traits::{hasher_for, HashAlgorithm, HashAlgorithmKind};
use super::{
    Analysis, FailureDisposition, Fingerprint, FingerprintStrategy, GroupingMode,
    PerceptualSignature,
};
use crate::core::quality::QualitySignals;
use crate::core::scanner::FileRecord;
use crate::error::FingerprintError;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Decodes each image once and computes one perceptual code per configured
/// algorithm.
pub struct ImageStrategy {
    hashers: Vec<Box<dyn HashAlgorithm>>,
}

impl ImageStrategy {
    pub fn new(algorithms: &[HashAlgorithmKind], hash_size: u32) -> Self {
        Self {
            hashers: algorithms
                .iter()
                .map(|kind| hasher_for(*kind, hash_size))
                .collect(),
        }
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, FingerprintError> {
        let image = FastDecoder::decode(path)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(FingerprintError::EmptyContent {
                path: path.to_path_buf(),
            });
        }
        // Normalize palette, alpha and 16-bit variants before hashing
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }

    fn signature(&self, image: &DynamicImage) -> Result<PerceptualSignature, FingerprintError> {
        let codes = self
            .hashers
            .iter()
            .map(|hasher| hasher.hash_image(image))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PerceptualSignature::new(codes))
    }
}

impl FingerprintStrategy for ImageStrategy {
    fn name(&self) -> &'static str {
        "perceptual-image"
    }

    fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let image = self.decode(path)?;
        self.signature(&image).map(Fingerprint::Perceptual)
    }

    fn analyze(&self, record: &FileRecord) -> Result<Analysis, FingerprintError> {
        let image = self.decode(&record.path)?;
        let signature = self.signature(&image)?;
        debug!(
            path = %record.path.display(),
            width = image.width(),
            height = image.height(),
            "image fingerprinted"
        );

        Ok(Analysis {
            fingerprint: Fingerprint::Perceptual(signature),
            quality: QualitySignals::from_size(record.size)
                .with_dimensions(image.width(), image.height()),
        })
    }

    fn grouping(&self) -> GroupingMode {
        GroupingMode::Clustering
    }

    fn failure_disposition(&self) -> FailureDisposition {
        FailureDisposition::Quarantine
    }
}
