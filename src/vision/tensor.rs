// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image-to-tensor conversion for the ONNX models

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// Recognition model input height (PP-OCR recognition models use 48)
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 960;

/// Padding colour used by YOLO letterboxing
pub const LETTERBOX_FILL: u8 = 114;

/// Stride every detector input side must be a multiple of
pub const DETECTOR_STRIDE: u32 = 32;

/// Scale and padding applied by `letterbox`, used to map model-space
/// coordinates back onto the source image
#[derive(Debug, Clone, Copy)]
pub struct LetterboxInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    /// Side of the square model input
    pub target_size: u32,
}

impl LetterboxInfo {
    /// Map a coordinate from model-input space back to source image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (orig_x, orig_y)
    }
}

/// Round a requested inference size to the detector stride
pub fn align_to_stride(size: u32) -> u32 {
    let aligned = (size + DETECTOR_STRIDE / 2) / DETECTOR_STRIDE * DETECTOR_STRIDE;
    aligned.max(DETECTOR_STRIDE)
}

/// Resize with aspect ratio preservation and pad to a square
///
/// The image is scaled to fit within `target_size x target_size` and
/// centred on a `LETTERBOX_FILL` grey canvas.
pub fn letterbox(image: &RgbImage, target_size: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();
    let mut output = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([LETTERBOX_FILL, LETTERBOX_FILL, LETTERBOX_FILL]),
    );

    if orig_w == 0 || orig_h == 0 {
        let info = LetterboxInfo {
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
            target_size,
        };
        return (output, info);
    }

    let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let offset_x = (target_size - new_w) / 2;
    let offset_y = (target_size - new_h) / 2;
    image::imageops::replace(&mut output, &resized, offset_x as i64, offset_y as i64);

    let info = LetterboxInfo {
        scale,
        offset_x,
        offset_y,
        target_size,
    };
    (output, info)
}

/// Letterbox and convert to an NCHW tensor scaled to `[0, 1]`
pub fn preprocess_for_detection(image: &RgbImage, target_size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (boxed, info) = letterbox(image, target_size);
    let size = target_size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for (x, y, pixel) in boxed.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}

/// Preprocess a region for recognition
///
/// Height is fixed at `REC_INPUT_HEIGHT`, width follows the aspect ratio
/// (at least 4, at most `REC_MAX_WIDTH`). Pixels are scaled to `[-1, 1]`.
pub fn preprocess_for_recognition(image: &RgbImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32).clamp(4, REC_MAX_WIDTH);

    let resized = image::imageops::resize(image, new_width, REC_INPUT_HEIGHT, FilterType::Triangle);

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, new_width as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}
