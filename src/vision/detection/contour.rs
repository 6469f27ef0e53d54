// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Edge + contour detector (classical fallback)
//!
//! Finds the single largest closed outline in the image and reports its
//! bounding rectangle as a generic "document" region. There is no semantic
//! classification here, so the score is a fixed moderate value.

use anyhow::Result;
use image::{imageops, GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use tracing::debug;

use super::{DetectParams, Detection, Detector, DetectorKind};
use crate::vision::geometry::{clamp_box, BoundingBox};

/// Score assigned to the synthesized detection
pub const FALLBACK_SCORE: f32 = 0.5;

/// Label assigned to the synthesized detection
pub const FALLBACK_LABEL: &str = "document";

/// Regions below this share of the image area are treated as noise
pub const MIN_AREA_RATIO: f32 = 0.02;

const BLUR_SIGMA: f32 = 1.4;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ContourDetector;

impl ContourDetector {
    pub fn new() -> Self {
        Self
    }

    /// Largest outer outline as a pixel bounding box, if any
    fn largest_region(&self, image: &RgbImage) -> Option<BoundingBox> {
        let gray = imageops::grayscale(image);
        let edges = edge_map(&gray);

        let contours = find_contours::<i32>(&edges);
        let best = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter(|c| !c.points.is_empty())
            .map(|c| (enclosed_area(c), c))
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))?;

        debug!(
            "Contour fallback: {} contours, largest enclosed area {:.0}",
            contours.len(),
            best.0
        );

        Some(bounding_rect(best.1))
    }
}

impl Detector for ContourDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Classical
    }

    fn detect(&self, image: &RgbImage, _params: &DetectParams) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let Some(rect) = self.largest_region(image) else {
            return Ok(Vec::new());
        };

        let image_area = width as f32 * height as f32;
        if rect.area() < MIN_AREA_RATIO * image_area {
            debug!(
                "Contour fallback region rejected: {:.0} px < {:.0}% of image",
                rect.area(),
                MIN_AREA_RATIO * 100.0
            );
            return Ok(Vec::new());
        }

        Ok(clamp_box(&rect, width, height)
            .map(|bbox| Detection::new(bbox, FALLBACK_SCORE, FALLBACK_LABEL))
            .into_iter()
            .collect())
    }
}

/// Blurred Canny edges, thickened by one pixel so broken outlines close
fn edge_map(gray: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, BLUR_SIGMA);
    let edges = canny(&blurred, CANNY_LOW, CANNY_HIGH);
    dilate(&edges, Norm::LInf, 1)
}

/// Shoelace area of a contour polygon
fn enclosed_area(contour: &Contour<i32>) -> f32 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f32 / 2.0
}

fn bounding_rect(contour: &Contour<i32>) -> BoundingBox {
    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    // Contour points are pixel centres; the rectangle covers whole pixels
    BoundingBox::from_corners(
        min_x as f32,
        min_y as f32,
        (max_x + 1) as f32,
        (max_y + 1) as f32,
    )
}
