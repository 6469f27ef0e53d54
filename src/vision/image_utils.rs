// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image loading and utility functions for vision processing

use std::io::Cursor;

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use thiserror::Error;

/// Default maximum upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Custom error types for image processing
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Image has zero width or height")]
    ZeroDimension,

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels (after orientation is applied)
    pub width: u32,
    /// Height in pixels (after orientation is applied)
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode uploaded image bytes into an oriented RGB raster
///
/// The EXIF orientation tag (when the container carries one) is applied
/// exactly once here; everything downstream sees an upright image.
///
/// # Errors
/// * `EmptyData` / `TooLarge` - size checks against `max_size`
/// * `UnsupportedFormat` - magic bytes match no known raster format
/// * `DecodeFailed` - corrupt or truncated data
/// * `ZeroDimension` - the decoded raster has no pixels
pub fn decode_image_bytes(
    bytes: &[u8],
    max_size: usize,
) -> Result<(RgbImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    if bytes.len() > max_size {
        return Err(ImageError::TooLarge(bytes.len(), max_size));
    }

    let format = detect_format(bytes)?;

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
        .into_decoder()
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    // Missing or unreadable EXIF is not fatal: treat as upright
    let orientation = decoder
        .orientation()
        .unwrap_or(image::metadata::Orientation::NoTransforms);
    let mut img =
        DynamicImage::from_decoder(decoder).map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    img.apply_orientation(orientation);

    let rgb = img.into_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(ImageError::ZeroDimension);
    }

    let info = ImageInfo {
        width: rgb.width(),
        height: rgb.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((rgb, info))
}

/// Detect image format from magic bytes
///
/// # Returns
/// * `Ok(ImageFormat)` - Detected format
/// * `Err(ImageError::UnsupportedFormat)` - If format cannot be detected
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Encode an RGB raster as PNG bytes
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}
