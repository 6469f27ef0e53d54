// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for ROI detection and text extraction
//!
//! This module provides:
//! - Box geometry and ROI clamping
//! - Region detection (YOLO ONNX, contour fallback)
//! - ROI enhancement ahead of recognition
//! - Text recognition (PaddleOCR ONNX, tesseract)
//!
//! Everything runs on CPU.

pub mod annotate;
pub mod backends;
pub mod detection;
pub mod geometry;
pub mod image_utils;
pub mod ocr;
pub mod preprocessing;
pub mod tensor;

pub use backends::{BackendAvailability, Readiness, VisionBackendConfig, VisionBackends};
pub use detection::{DetectParams, Detection, Detector, DetectorKind};
pub use geometry::{clamp_box, rank_by_area_descending, BoundingBox, NormalizedBox};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use ocr::{RecognizedText, Recognizer, RecognizerKind};
pub use preprocessing::RoiPreprocessor;
