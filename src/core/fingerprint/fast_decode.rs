//! Image decoding with a JPEG fast path.
//!
//! JPEGs go through zune-jpeg; everything else (and any JPEG zune rejects)
//! falls back to the image crate.

use crate::core::scanner::extension_of;
use crate::error::FingerprintError;
use image::{DynamicImage, ImageBuffer};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Image format, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Other,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Self {
        match extension_of(path).as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            _ => Self::Other,
        }
    }
}

pub struct FastDecoder;

impl FastDecoder {
    /// Decode an image file using the fastest decoder for its format
    pub fn decode(path: &Path) -> Result<DynamicImage, FingerprintError> {
        match ImageFormat::from_path(path) {
            ImageFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path)),
            _ => Self::decode_fallback(path),
        }
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, FingerprintError> {
        let bytes = fs::read(path).map_err(|source| FingerprintError::IoFailure {
            path: path.to_path_buf(),
            source,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&bytes, options);

        let pixels = decoder.decode().map_err(|e| FingerprintError::DecodeFailed {
            path: path.to_path_buf(),
            reason: format!("zune-jpeg: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| FingerprintError::DecodeFailed {
            path: path.to_path_buf(),
            reason: "missing JPEG header info".to_string(),
        })?;
        let (width, height) = (info.width as u32, info.height as u32);

        let bad_buffer = || FingerprintError::DecodeFailed {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match dimensions".to_string(),
        };

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(bad_buffer),
            ColorSpace::RGBA => ImageBuffer::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(bad_buffer),
            ColorSpace::Luma => ImageBuffer::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(bad_buffer),
            _ => Self::decode_fallback(path),
        }
    }

    fn decode_fallback(path: &Path) -> Result<DynamicImage, FingerprintError> {
        image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => FingerprintError::IoFailure {
                path: path.to_path_buf(),
                source,
            },
            other => FingerprintError::DecodeFailed {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })
    }
}
