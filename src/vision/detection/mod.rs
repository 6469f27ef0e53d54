// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Region detectors
//!
//! Two variants sit behind the [`Detector`] trait:
//! - `yolo` - YOLO-family ONNX object detector (primary)
//! - `contour` - edge + contour classical fallback
//!
//! A detector either answers or fails; the pipeline turns failures into an
//! empty detection list, so "no objects" and "detector absent" look the same.

pub mod contour;
pub mod labels;
pub mod yolo;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::vision::geometry::{BoundingBox, HasBox};

pub use contour::ContourDetector;
pub use labels::{is_document_like, ClassNames, DOCUMENT_LABELS};
pub use yolo::YoloDetector;

/// A scored, labelled region produced by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    pub score: f32,
    pub label: String,
}

impl Detection {
    pub fn new(bbox: BoundingBox, score: f32, label: impl Into<String>) -> Self {
        Self {
            bbox,
            score: score.clamp(0.0, 1.0),
            label: label.into(),
        }
    }
}

impl HasBox for Detection {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

/// Which detector produced a request's detections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Primary,
    Classical,
    None,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Primary => "yolo",
            DetectorKind::Classical => "contour",
            DetectorKind::None => "none",
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call detector knobs taken from the request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Minimum score kept by the detector itself
    pub confidence_threshold: f32,
    /// Side of the square model input
    pub inference_size: u32,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            inference_size: 640,
        }
    }
}

/// Maps an oriented RGB image to detections
///
/// Implementations hold read-only model state; `detect` may be called from
/// any thread.
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(&self, image: &RgbImage, params: &DetectParams) -> anyhow::Result<Vec<Detection>>;
}
