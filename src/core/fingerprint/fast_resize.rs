//! SIMD-accelerated grayscale downscaling.
//!
//! Hashes only ever need a tiny grayscale thumbnail, so everything goes
//! through fast_image_resize with a bilinear convolution.

use crate::error::FingerprintError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer};

/// Reusable grayscale resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert to grayscale and resize to exactly `width` x `height`
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, FingerprintError> {
        self.resize_gray(&image.to_luma8(), width, height)
    }

    /// Resize an already-grayscale buffer
    pub fn resize_gray(
        &mut self,
        gray: &GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, FingerprintError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(FingerprintError::ComputationFailed(
                "invalid source dimensions".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(FingerprintError::ComputationFailed(
                "invalid destination dimensions".to_string(),
            ));
        }

        let src = Image::from_vec_u8(gray.width(), gray.height(), gray.as_raw().clone(), PixelType::U8)
            .map_err(|e| FingerprintError::ComputationFailed(format!("source buffer: {}", e)))?;
        let mut dst = Image::new(width, height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src, &mut dst, &options)
            .map_err(|e| FingerprintError::ComputationFailed(format!("resize failed: {}", e)))?;

        ImageBuffer::from_raw(width, height, dst.into_vec()).ok_or_else(|| {
            FingerprintError::ComputationFailed("resized buffer size mismatch".to_string())
        })
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off resize helper
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, FingerprintError> {
    FastResizer::new().resize_to_grayscale(image, width, height)
}
