// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup-time backend selection for detection and recognition
//!
//! Every backend is probed once. Missing models or binaries are logged and
//! leave that slot empty; the resulting [`BackendAvailability`] never
//! changes afterwards.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::vision::detection::{ContourDetector, Detector, DetectorKind, YoloDetector};
use crate::vision::ocr::{PaddleOcrRecognizer, Recognizer, RecognizerKind, TesseractRecognizer};
use crate::vision::preprocessing::RoiPreprocessor;

/// Configuration for loading vision backends
#[derive(Debug, Clone)]
pub struct VisionBackendConfig {
    /// Primary detector ONNX file
    pub detector_model_path: PathBuf,
    /// Optional class-name table for the detector (COCO when absent)
    pub detector_labels_path: Option<PathBuf>,
    /// PaddleOCR model directory (`None` disables the neural recognizer)
    pub ocr_model_dir: Option<PathBuf>,
    /// Tesseract executable (`None` disables the classical recognizer)
    pub tesseract_bin: Option<PathBuf>,
    /// Whether the contour detector may stand in for the primary one
    pub enable_classical_fallback: bool,
    /// Whether ROI enhancement runs before recognition
    pub enable_preprocessing: bool,
}

impl Default for VisionBackendConfig {
    fn default() -> Self {
        Self {
            detector_model_path: PathBuf::from("./models/yolov8n.onnx"),
            detector_labels_path: None,
            ocr_model_dir: Some(PathBuf::from("./models/paddleocr-onnx")),
            tesseract_bin: Some(PathBuf::from("tesseract")),
            enable_classical_fallback: true,
            enable_preprocessing: true,
        }
    }
}

/// What initialized successfully at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendAvailability {
    pub primary_detector: bool,
    pub classical_fallback: bool,
    pub recognizer: RecognizerKind,
    pub preprocessing: bool,
    /// Classes known to the primary detector (0 when absent)
    pub num_classes: usize,
}

/// Readiness summary reported by the health endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Readiness {
    pub model_loaded: bool,
    pub num_classes: usize,
    pub detector: String,
    pub fallback: String,
    pub recognizer: String,
    pub inference_slots: usize,
}

impl BackendAvailability {
    /// Detector that answers first for a request
    pub fn detector_kind(&self) -> DetectorKind {
        if self.primary_detector {
            DetectorKind::Primary
        } else if self.classical_fallback {
            DetectorKind::Classical
        } else {
            DetectorKind::None
        }
    }

    pub fn readiness(&self, inference_slots: usize) -> Readiness {
        Readiness {
            model_loaded: self.primary_detector,
            num_classes: self.num_classes,
            detector: self.detector_kind().to_string(),
            fallback: if self.classical_fallback {
                DetectorKind::Classical.to_string()
            } else {
                DetectorKind::None.to_string()
            },
            recognizer: self.recognizer.to_string(),
            inference_slots,
        }
    }
}

/// Process-wide, read-only set of selected backends
pub struct VisionBackends {
    availability: BackendAvailability,
    primary: Option<Arc<dyn Detector>>,
    fallback: Option<Arc<dyn Detector>>,
    recognizer: Option<Arc<dyn Recognizer>>,
    preprocessor: RoiPreprocessor,
}

impl std::fmt::Debug for VisionBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionBackends")
            .field("availability", &self.availability)
            .finish_non_exhaustive()
    }
}

impl VisionBackends {
    /// Assemble from already-built parts; availability follows from which
    /// slots are filled
    pub fn new(
        primary: Option<Arc<dyn Detector>>,
        fallback: Option<Arc<dyn Detector>>,
        recognizer: Option<Arc<dyn Recognizer>>,
        preprocessor: RoiPreprocessor,
    ) -> Self {
        let availability = BackendAvailability {
            primary_detector: primary.is_some(),
            classical_fallback: fallback.is_some(),
            recognizer: recognizer
                .as_ref()
                .map(|r| r.kind())
                .unwrap_or(RecognizerKind::None),
            preprocessing: preprocessor.is_available(),
            num_classes: 0,
        };

        Self {
            availability,
            primary,
            fallback,
            recognizer,
            preprocessor,
        }
    }

    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.availability.num_classes = num_classes;
        self
    }

    /// No backends at all
    pub fn empty() -> Self {
        Self::new(None, None, None, RoiPreprocessor::passthrough())
    }

    /// Probe and load every backend named by `config`
    ///
    /// Never fails: each backend that cannot be initialized is logged at
    /// `warn` and left out.
    pub async fn load(config: VisionBackendConfig) -> Self {
        let detector_config = config.clone();
        let primary = tokio::task::spawn_blocking(move || {
            YoloDetector::load(
                &detector_config.detector_model_path,
                detector_config.detector_labels_path.as_deref(),
            )
        })
        .await;

        let (primary, num_classes) = match primary {
            Ok(Ok(detector)) => {
                let classes = detector.num_classes();
                (Some(Arc::new(detector) as Arc<dyn Detector>), classes)
            }
            Ok(Err(e)) => {
                warn!(
                    "⚠️ Failed to load detector model from {}: {:#}",
                    config.detector_model_path.display(),
                    e
                );
                (None, 0)
            }
            Err(e) => {
                warn!("⚠️ Detector loading task failed: {}", e);
                (None, 0)
            }
        };

        let fallback = if config.enable_classical_fallback {
            info!("✅ Contour fallback detector enabled");
            Some(Arc::new(ContourDetector::new()) as Arc<dyn Detector>)
        } else {
            info!("Contour fallback detector disabled");
            None
        };

        let recognizer = select_recognizer(&config).await;

        let preprocessor = if config.enable_preprocessing {
            RoiPreprocessor::default()
        } else {
            RoiPreprocessor::passthrough()
        };

        let backends =
            Self::new(primary, fallback, recognizer, preprocessor).with_num_classes(num_classes);
        info!(
            "Vision backends ready: detector={}, recognizer={}",
            backends.availability.detector_kind(),
            backends.availability.recognizer
        );
        backends
    }

    pub fn availability(&self) -> &BackendAvailability {
        &self.availability
    }

    pub fn primary(&self) -> Option<&Arc<dyn Detector>> {
        self.primary.as_ref()
    }

    pub fn fallback(&self) -> Option<&Arc<dyn Detector>> {
        self.fallback.as_ref()
    }

    pub fn recognizer(&self) -> Option<&Arc<dyn Recognizer>> {
        self.recognizer.as_ref()
    }

    pub fn preprocessor(&self) -> &RoiPreprocessor {
        &self.preprocessor
    }
}

/// Neural first, then tesseract, then nothing
async fn select_recognizer(config: &VisionBackendConfig) -> Option<Arc<dyn Recognizer>> {
    if let Some(dir) = config.ocr_model_dir.clone() {
        let shown = dir.display().to_string();
        match tokio::task::spawn_blocking(move || PaddleOcrRecognizer::load_dir(dir)).await {
            Ok(Ok(model)) => {
                info!("✅ PaddleOCR recognizer loaded from {}", shown);
                return Some(Arc::new(model));
            }
            Ok(Err(e)) => warn!("⚠️ Failed to load OCR model from {}: {:#}", shown, e),
            Err(e) => warn!("⚠️ OCR loading task failed: {}", e),
        }
    }

    if let Some(bin) = config.tesseract_bin.clone() {
        let shown = bin.display().to_string();
        match tokio::task::spawn_blocking(move || TesseractRecognizer::probe(bin)).await {
            Ok(Ok(tesseract)) => return Some(Arc::new(tesseract)),
            Ok(Err(e)) => warn!("⚠️ Tesseract not usable ({}): {:#}", shown, e),
            Err(e) => warn!("⚠️ Tesseract probe task failed: {}", e),
        }
    }

    warn!("⚠️ No text recognition backend available; text will be empty");
    None
}
