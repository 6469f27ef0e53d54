// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ROI enhancement ahead of text recognition
//!
//! Steps, in order:
//! 1. Size cap (downscale only) to `MAX_ROI_SIDE`
//! 2. Luminance conversion
//! 3. Median smoothing (edge preserving)
//! 4. Adaptive mean-C binarization, Otsu global threshold as fallback
//! 5. 2x2 morphological opening
//! 6. Back to three channels
//!
//! Every step is best-effort: a step that cannot run leaves the previous
//! result untouched. A passthrough preprocessor returns its input as-is.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{self, otsu_level};
use imageproc::filter::median_filter;
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};
use tracing::debug;

/// Largest ROI side handed to a recognizer
pub const MAX_ROI_SIDE: u32 = 1200;

/// Half-size of the adaptive threshold neighbourhood (31x31 block)
pub const ADAPTIVE_BLOCK_RADIUS: u32 = 15;

/// Constant subtracted from the local mean before comparison
pub const ADAPTIVE_C: i32 = 10;

/// Interpolation used by the size cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStrategy {
    /// Area averaging (each source pixel contributes to one target pixel)
    AreaAverage,
    /// Bilinear
    Linear,
}

/// Which binarization actually ran for an ROI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarization {
    Adaptive,
    Otsu,
}

/// Capability-checked ROI enhancement stage
#[derive(Debug, Clone, Copy)]
pub struct RoiPreprocessor {
    enhance: bool,
    resize: ResizeStrategy,
}

impl Default for RoiPreprocessor {
    fn default() -> Self {
        Self {
            enhance: true,
            resize: ResizeStrategy::AreaAverage,
        }
    }
}

impl RoiPreprocessor {
    /// Stage used when image enhancement is unavailable: identity transform
    pub fn passthrough() -> Self {
        Self {
            enhance: false,
            resize: ResizeStrategy::AreaAverage,
        }
    }

    pub fn with_resize_strategy(mut self, resize: ResizeStrategy) -> Self {
        self.resize = resize;
        self
    }

    /// Whether the enhancement pass runs at all
    pub fn is_available(&self) -> bool {
        self.enhance
    }

    /// Prepare a cropped region for recognition
    pub fn prepare_for_recognition(&self, region: &RgbImage) -> RgbImage {
        if !self.enhance || region.width() == 0 || region.height() == 0 {
            return region.clone();
        }

        let capped = cap_size(region, MAX_ROI_SIDE, self.resize).unwrap_or_else(|| region.clone());
        let gray = imageops::grayscale(&capped);
        let smoothed = smooth(&gray).unwrap_or(gray);
        let (binary, method) = binarize(&smoothed);
        let opened = open_2x2(&binary).unwrap_or(binary);

        debug!(
            "ROI preprocessed: {}x{} -> {}x{} ({:?})",
            region.width(),
            region.height(),
            opened.width(),
            opened.height(),
            method
        );

        to_rgb(&opened)
    }
}

/// Downscale so neither side exceeds `max_side`, preserving aspect ratio.
///
/// Returns `None` when no resize is needed. Never upscales.
pub fn cap_size(image: &RgbImage, max_side: u32, strategy: ResizeStrategy) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if longest <= max_side || longest == 0 {
        return None;
    }

    let scale = max_side as f32 / longest as f32;
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, max_side);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, max_side);

    Some(match strategy {
        ResizeStrategy::AreaAverage => imageops::thumbnail(image, new_w, new_h),
        ResizeStrategy::Linear => imageops::resize(image, new_w, new_h, FilterType::Triangle),
    })
}

fn smooth(gray: &GrayImage) -> Option<GrayImage> {
    if gray.width() < 3 || gray.height() < 3 {
        return None;
    }
    Some(median_filter(gray, 1, 1))
}

/// Binarize to {0, 255}, preferring a locally varying threshold
pub fn binarize(gray: &GrayImage) -> (GrayImage, Binarization) {
    match adaptive_threshold(gray, ADAPTIVE_BLOCK_RADIUS, ADAPTIVE_C) {
        Some(binary) => (binary, Binarization::Adaptive),
        None => (otsu_threshold(gray), Binarization::Otsu),
    }
}

/// Mean-C adaptive threshold: a pixel is white when it is at least the
/// mean of its `(2r+1)^2` neighbourhood minus `c`.
///
/// Unavailable (returns `None`) when the ROI is smaller than one block.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, c: i32) -> Option<GrayImage> {
    let block = 2 * block_radius + 1;
    if block_radius == 0 || gray.width() < block || gray.height() < block {
        return None;
    }
    Some(contrast::adaptive_threshold(gray, block_radius, c))
}

/// Global threshold at the Otsu level (maximum inter-class variance)
pub fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Morphological opening with a 2x2 square structuring element.
///
/// Erosion takes the minimum over `{x, x+1} x {y, y+1}`; dilation takes the
/// maximum over `{x-1, x} x {y-1, y}`, so a surviving 2x2 block stays
/// exactly in place. Out-of-range neighbours are ignored.
pub fn open_2x2(image: &GrayImage) -> Option<GrayImage> {
    if image.width() < 2 || image.height() < 2 {
        return None;
    }

    let square = GrayImage::from_pixel(2, 2, Luma([255]));
    let eroded = grayscale_erode(image, &Mask::from_image(&square, 0, 0));
    Some(grayscale_dilate(&eroded, &Mask::from_image(&square, 1, 1)))
}

fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        image::Rgb([v, v, v])
    })
}
