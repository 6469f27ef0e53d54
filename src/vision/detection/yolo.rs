// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO object detector (primary variant)
//!
//! Runs a YOLOv8-style ONNX export on CPU. The model emits one row per
//! anchor: `[cx, cy, w, h, class_0 .. class_n]` in letterboxed input space.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ndarray::{ArrayD, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::labels::ClassNames;
use super::{DetectParams, Detection, Detector, DetectorKind};
use crate::vision::geometry::{clamp_box, BoundingBox};
use crate::vision::tensor::{align_to_stride, preprocess_for_detection, LetterboxInfo};

/// IoU above which a lower-scored box of the same class is suppressed
pub const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Upper bound on boxes kept per image
pub const MAX_DETECTIONS: usize = 300;

/// YOLO object detector backed by an ONNX Runtime session
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session (`run` needs exclusive access)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Class id to label table
    names: Arc<ClassNames>,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_name", &self.input_name)
            .field("num_classes", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detector from an ONNX file
    ///
    /// `names_path` points at a one-class-per-line table; without it the
    /// COCO names are used.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    /// - The names file cannot be read
    pub fn load<P: AsRef<Path>>(model_path: P, names_path: Option<&Path>) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detector model not found: {}", model_path.display());
        }

        info!("Loading detector model from {}", model_path.display());

        let names = match names_path {
            Some(path) => ClassNames::load(path)?,
            None => ClassNames::coco(),
        };

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load detector model from {}", model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        info!(
            "✅ Detector model loaded ({} classes, input: {})",
            names.len(),
            input_name
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            names: Arc::new(names),
        })
    }

    /// Number of labelled classes the model knows
    pub fn num_classes(&self) -> usize {
        self.names.len()
    }

    fn infer(&self, image: &RgbImage, params: &DetectParams) -> Result<Vec<Detection>> {
        let target = align_to_stride(params.inference_size);
        let (input, letterbox) = preprocess_for_detection(image, target);

        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("Detector session lock poisoned"))?;

            let input_value = Value::from_array(input).context("Failed to create input tensor")?;
            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Detection inference failed")?;
            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            tensor.to_owned()
        };

        debug!("Detector output shape: {:?}", output.shape());

        decode_output(
            &output,
            &letterbox,
            params.confidence_threshold,
            image.dimensions(),
            &self.names,
        )
    }
}

impl Detector for YoloDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Primary
    }

    fn detect(&self, image: &RgbImage, params: &DetectParams) -> Result<Vec<Detection>> {
        self.infer(image, params)
    }
}

struct Candidate {
    class_id: usize,
    score: f32,
    corners: [f32; 4],
}

/// Which axis of a `[1, a, b]` output carries `4 + classes` channels
///
/// The class table decides when one axis matches it exactly. Otherwise an
/// axis too short to hold a class channel must be the anchor axis, and
/// failing that the shorter axis is taken as channels.
fn is_channels_first(dim1: usize, dim2: usize, num_classes: usize) -> bool {
    let expected = 4 + num_classes;
    if dim1 == expected {
        true
    } else if dim2 == expected {
        false
    } else if dim1 <= 4 {
        false
    } else if dim2 <= 4 {
        true
    } else {
        dim1 < dim2
    }
}

/// Decode a raw YOLO output tensor into clamped, labelled detections
///
/// Accepts `[1, 4 + classes, anchors]` (stock export) as well as the
/// transposed `[1, anchors, 4 + classes]` layout.
pub fn decode_output(
    output: &ArrayD<f32>,
    letterbox: &LetterboxInfo,
    confidence_threshold: f32,
    image_size: (u32, u32),
    names: &ClassNames,
) -> Result<Vec<Detection>> {
    let output = output
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| anyhow!("Unexpected detector output shape: {:?}", output.shape()))?;

    let (dim1, dim2) = (output.shape()[1], output.shape()[2]);
    let channels_first = is_channels_first(dim1, dim2, names.len());
    let (channels, anchors) = if channels_first {
        (dim1, dim2)
    } else {
        (dim2, dim1)
    };
    if channels <= 4 {
        anyhow::bail!("Detector output has no class channels: {:?}", output.shape());
    }

    let at = |anchor: usize, channel: usize| {
        if channels_first {
            output[[0, channel, anchor]]
        } else {
            output[[0, anchor, channel]]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, score) = (4..channels)
            .map(|c| (c - 4, at(anchor, c)))
            .fold((0usize, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(anchor, 0), at(anchor, 1), at(anchor, 2), at(anchor, 3));
        let (x1, y1) = letterbox.map_to_original(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.map_to_original(cx + w / 2.0, cy + h / 2.0);
        candidates.push(Candidate {
            class_id,
            score,
            corners: [x1, y1, x2, y2],
        });
    }

    let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD);

    let (img_w, img_h) = image_size;
    let detections = kept
        .into_iter()
        .take(MAX_DETECTIONS)
        .filter_map(|c| {
            let [x1, y1, x2, y2] = c.corners;
            let bbox = BoundingBox::from_corners(x1, y1, x2, y2);
            clamp_box(&bbox, img_w, img_h)
                .map(|clamped| Detection::new(clamped, c.score, names.resolve(c.class_id)))
        })
        .collect();

    Ok(detections)
}

/// Greedy per-class NMS; output is sorted by descending score
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let [x1, y1, x2, y2] = candidate.corners;
        let bbox = BoundingBox::from_corners(x1, y1, x2, y2);
        let suppressed = kept.iter().any(|k| {
            let [kx1, ky1, kx2, ky2] = k.corners;
            k.class_id == candidate.class_id
                && BoundingBox::from_corners(kx1, ky1, kx2, ky2).iou(&bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
