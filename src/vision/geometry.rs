// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Box geometry for regions of interest
//!
//! Boxes are kept in absolute pixel units of the oriented source image.
//! The normalized `[0, 1]` form is derived on output only.

use serde::{Deserialize, Serialize};

/// Minimum side length (pixels) a clamped ROI must exceed to be usable
pub const MIN_ROI_SIDE: f32 = 2.0;

/// Axis-aligned bounding box in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Bounding box expressed as fractions of the image size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub nx: f32,
    pub ny: f32,
    pub nwidth: f32,
    pub nheight: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from absolute corner coordinates.
    ///
    /// Inverted or degenerate corners produce a zero width/height rather than
    /// a negative one. No clamping to the image happens here; see
    /// [`clamp_box`].
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0.0),
            height: (y2 - y1).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        area(self)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let iy = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Normalized companion form. Callers guarantee non-zero image dimensions
    /// (zero-sized images are rejected at decode time).
    pub fn normalized(&self, image_width: u32, image_height: u32) -> NormalizedBox {
        let w = image_width.max(1) as f32;
        let h = image_height.max(1) as f32;
        NormalizedBox {
            nx: self.x / w,
            ny: self.y / h,
            nwidth: self.width / w,
            nheight: self.height / h,
        }
    }

    /// Integer crop rectangle `(x, y, width, height)` covering this box,
    /// limited to the image bounds.
    pub fn pixel_rect(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let x0 = (self.x.floor().max(0.0) as u32).min(image_width);
        let y0 = (self.y.floor().max(0.0) as u32).min(image_height);
        let x1 = (self.right().ceil().max(0.0) as u32).min(image_width);
        let y1 = (self.bottom().ceil().max(0.0) as u32).min(image_height);
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// Area of a box in square pixels
pub fn area(bbox: &BoundingBox) -> f32 {
    bbox.width.max(0.0) * bbox.height.max(0.0)
}

/// Truncate a box to `[0, W] x [0, H]`.
///
/// Returns `None` when the clamped width or height is not larger than
/// [`MIN_ROI_SIDE`], so callers never crop a degenerate ROI.
pub fn clamp_box(bbox: &BoundingBox, image_width: u32, image_height: u32) -> Option<BoundingBox> {
    let w = image_width as f32;
    let h = image_height as f32;

    let x0 = bbox.x.clamp(0.0, w);
    let y0 = bbox.y.clamp(0.0, h);
    let x1 = (bbox.x + bbox.width.max(0.0)).clamp(0.0, w);
    let y1 = (bbox.y + bbox.height.max(0.0)).clamp(0.0, h);

    let width = x1 - x0;
    let height = y1 - y0;
    if width <= MIN_ROI_SIDE || height <= MIN_ROI_SIDE {
        return None;
    }

    Some(BoundingBox {
        x: x0,
        y: y0,
        width,
        height,
    })
}

/// Anything that occupies a box in the source image
pub trait HasBox {
    fn bbox(&self) -> &BoundingBox;
}

impl HasBox for BoundingBox {
    fn bbox(&self) -> &BoundingBox {
        self
    }
}

/// Order items largest-area first.
///
/// The sort is stable: items of equal area keep the order they were
/// detected in.
pub fn rank_by_area_descending<T: HasBox>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(|a, b| {
        area(b.bbox())
            .partial_cmp(&area(a.bbox()))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items
}
