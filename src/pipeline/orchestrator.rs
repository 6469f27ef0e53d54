// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection and text extraction pipeline
//!
//! Decode -> detect (primary, then fallback once) -> filter -> rank ->
//! per region: crop, pre-process, recognize -> assemble.
//!
//! Each run holds an inference gate permit and executes on the blocking
//! pool. Faults below this boundary are caught here: backend faults
//! degrade, everything else becomes a `success = false` response.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use image::{imageops, RgbImage};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::{PipelineConfig, PipelineMode};
use super::errors::PipelineError;
use super::gate::InferenceGate;
use super::response::{PipelineResponse, RegionRecord};
use super::state::{PipelineState, StateTrace};
use crate::vision::annotate::annotated_png_base64;
use crate::vision::detection::is_document_like;
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::{
    clamp_box, decode_image_bytes, rank_by_area_descending, Detection, DetectorKind,
    RecognizedText, VisionBackends,
};

/// How a detection-only run should finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Boxes,
    AnnotatedBoxes,
}

impl Output {
    fn mode(&self) -> PipelineMode {
        match self {
            Output::Text => PipelineMode::ExtractText,
            Output::Boxes | Output::AnnotatedBoxes => PipelineMode::Detect,
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    backends: Arc<VisionBackends>,
    gate: InferenceGate,
    max_image_bytes: usize,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backends", &self.backends)
            .field("gate", &self.gate)
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(backends: Arc<VisionBackends>, gate: InferenceGate) -> Self {
        Self {
            backends,
            gate,
            max_image_bytes: MAX_IMAGE_SIZE,
        }
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn backends(&self) -> &Arc<VisionBackends> {
        &self.backends
    }

    pub fn gate(&self) -> &InferenceGate {
        &self.gate
    }

    /// Full path: regions with their recognized text
    pub async fn extract_text(&self, image: Bytes, config: PipelineConfig) -> PipelineResponse {
        self.run(image, config, Output::Text).await
    }

    /// Detection only; reports unavailability when the primary detector
    /// never loaded
    pub async fn detect(&self, image: Bytes, config: PipelineConfig) -> PipelineResponse {
        self.run(image, config, Output::Boxes).await
    }

    /// As [`Orchestrator::detect`], plus a PNG of the image with the boxes
    /// drawn on it
    pub async fn detect_annotated(&self, image: Bytes, config: PipelineConfig) -> PipelineResponse {
        self.run(image, config, Output::AnnotatedBoxes).await
    }

    async fn run(&self, image: Bytes, config: PipelineConfig, output: Output) -> PipelineResponse {
        let started = Instant::now();
        let availability = *self.backends.availability();
        let recognizer_used = match output {
            Output::Text => availability.recognizer.to_string(),
            _ => "none".to_string(),
        };

        if output.mode() == PipelineMode::Detect && !availability.primary_detector {
            warn!("⚠️ Detection requested but the detector model is not loaded");
            let mut response = PipelineResponse::failure(
                PipelineError::ModelUnavailable.to_string(),
                DetectorKind::None.to_string(),
                recognizer_used,
                elapsed_ms(started),
            );
            response.unavailable = true;
            return response;
        }

        let permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return PipelineResponse::failure(
                    e.to_string(),
                    availability.detector_kind().to_string(),
                    recognizer_used,
                    elapsed_ms(started),
                )
            }
        };

        let backends = Arc::clone(&self.backends);
        let max_bytes = self.max_image_bytes;
        // The permit lives as long as the blocking work, not the request
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            execute(&backends, &image, &config, output, max_bytes)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(PipelineError::Internal(format!("pipeline task failed: {}", e))),
        };

        match result {
            Ok(mut response) => {
                response.processing_time_ms = elapsed_ms(started);
                info!(
                    "Pipeline complete: {} regions via {} / {}, {:.1}ms",
                    response.detections.len(),
                    response.detector_used,
                    response.recognizer_used,
                    response.processing_time_ms
                );
                response
            }
            Err(e) => {
                warn!("Pipeline failed: {}", e);
                PipelineResponse::failure(
                    e.to_string(),
                    availability.detector_kind().to_string(),
                    recognizer_used,
                    elapsed_ms(started),
                )
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// One synchronous pipeline run
fn execute(
    backends: &VisionBackends,
    bytes: &[u8],
    config: &PipelineConfig,
    output: Output,
    max_bytes: usize,
) -> Result<PipelineResponse, PipelineError> {
    let mut trace = StateTrace::new(Uuid::new_v4());

    let (image, info) = match decode_image_bytes(bytes, max_bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            trace.advance(PipelineState::Error);
            return Err(PipelineError::DecodeFailure(e));
        }
    };
    trace.advance(PipelineState::ImageDecoded);
    debug!(
        "[{}] decoded {}x{} {:?}",
        trace.request_id(),
        info.width,
        info.height,
        info.format
    );

    let (detections, detector_used) = detect_regions(backends, &image, config);
    trace.advance(PipelineState::Detected);
    trace.advance(PipelineState::Filtered);

    let mut ranked = rank_by_area_descending(detections);
    ranked.truncate(config.max_results);
    trace.advance(PipelineState::Ranked);

    let (width, height) = image.dimensions();
    let to_record = |det: &Detection| RegionRecord {
        bbox: det.bbox,
        normalized: config
            .normalized
            .then(|| det.bbox.normalized(width, height)),
        score: det.score,
        label: det.label.clone(),
        text: None,
        recognition_score: None,
    };

    let (records, recognizer_used, annotated): (Vec<RegionRecord>, String, Option<String>) =
        match output {
            Output::Text => {
                let records = recognize_regions(backends, &image, &ranked, &mut trace)
                    .into_iter()
                    .map(|(det, text)| RegionRecord {
                        text: Some(text.text),
                        recognition_score: Some(text.confidence),
                        ..to_record(&det)
                    })
                    .collect();
                (records, backends.availability().recognizer.to_string(), None)
            }
            Output::Boxes => (ranked.iter().map(to_record).collect(), "none".into(), None),
            Output::AnnotatedBoxes => {
                let annotated = match annotated_png_base64(&image, ranked.iter().map(|d| &d.bbox)) {
                    Ok(encoded) => Some(encoded),
                    Err(e) => {
                        warn!("⚠️ Failed to render annotated image: {}", e);
                        None
                    }
                };
                (ranked.iter().map(to_record).collect(), "none".into(), annotated)
            }
        };
    trace.advance(PipelineState::Assembled);

    let response = PipelineResponse {
        success: true,
        detections: records,
        image_width: width,
        image_height: height,
        detector_used: detector_used.to_string(),
        recognizer_used,
        processing_time_ms: 0.0,
        error: None,
        unavailable: false,
        annotated_image_base64: annotated,
    };
    trace.advance(PipelineState::Done);

    Ok(response)
}

/// Run the primary detector, then the fallback at most once if nothing
/// usable came back. Returns the filtered detections and the detector that
/// produced them.
fn detect_regions(
    backends: &VisionBackends,
    image: &RgbImage,
    config: &PipelineConfig,
) -> (Vec<Detection>, DetectorKind) {
    let params = config.detect_params();
    let (width, height) = image.dimensions();
    let mut used = DetectorKind::None;

    if let Some(primary) = backends.primary() {
        used = primary.kind();
        match primary.detect(image, &params) {
            Ok(raw) => {
                let found = raw.len();
                let kept = filter_detections(raw, config, width, height);
                debug!("Primary detector: {} raw, {} usable", found, kept.len());
                if !kept.is_empty() {
                    return (kept, used);
                }
            }
            Err(e) => {
                let fault = PipelineError::DetectionBackendFault {
                    detector: used,
                    message: format!("{:#}", e),
                };
                warn!("⚠️ {}", fault);
            }
        }
    }

    if let Some(fallback) = backends.fallback() {
        used = fallback.kind();
        match fallback.detect(image, &params) {
            Ok(raw) => {
                let kept = filter_detections(raw, config, width, height);
                debug!("Fallback detector: {} usable", kept.len());
                return (kept, used);
            }
            Err(e) => {
                let fault = PipelineError::DetectionBackendFault {
                    detector: used,
                    message: format!("{:#}", e),
                };
                warn!("⚠️ {}", fault);
            }
        }
    }

    (Vec::new(), used)
}

/// Drop low scores, non-document labels (when asked) and boxes that
/// collapse when clamped to the image
fn filter_detections(
    detections: Vec<Detection>,
    config: &PipelineConfig,
    width: u32,
    height: u32,
) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.score >= config.confidence_threshold)
        .filter(|d| !config.filter_labels || is_document_like(&d.label))
        .enumerate()
        .filter_map(|(index, d)| match clamp_box(&d.bbox, width, height) {
            Some(bbox) => Some(Detection { bbox, ..d }),
            None => {
                debug!("{}", PipelineError::DegenerateRegion { index });
                None
            }
        })
        .collect()
}

/// Crop, enhance and recognize each ranked region
///
/// Regions that cannot be cropped are skipped; a failed recognition call
/// yields empty text for that region only.
fn recognize_regions(
    backends: &VisionBackends,
    image: &RgbImage,
    ranked: &[Detection],
    trace: &mut StateTrace,
) -> Vec<(Detection, RecognizedText)> {
    let (width, height) = image.dimensions();
    let mut results = Vec::with_capacity(ranked.len());

    for (index, det) in ranked.iter().enumerate() {
        let Some(bbox) = clamp_box(&det.bbox, width, height) else {
            debug!("{}", PipelineError::DegenerateRegion { index });
            continue;
        };
        let (x, y, w, h) = bbox.pixel_rect(width, height);
        if w == 0 || h == 0 {
            debug!("{}", PipelineError::DegenerateRegion { index });
            continue;
        }

        let roi = imageops::crop_imm(image, x, y, w, h).to_image();
        trace.advance(PipelineState::Cropped(index));

        let prepared = backends.preprocessor().prepare_for_recognition(&roi);
        trace.advance(PipelineState::PreProcessed(index));

        let text = match backends.recognizer() {
            None => RecognizedText::empty(),
            Some(recognizer) => match recognizer.recognize(&prepared) {
                Ok(text) => text,
                Err(e) => {
                    let fault = PipelineError::RecognitionBackendFault {
                        recognizer: recognizer.kind(),
                        index,
                        message: format!("{:#}", e),
                    };
                    warn!("⚠️ {}", fault);
                    RecognizedText::empty()
                }
            },
        };
        trace.advance(PipelineState::Recognized(index));

        results.push((Detection { bbox, ..det.clone() }, text));
    }

    results
}
