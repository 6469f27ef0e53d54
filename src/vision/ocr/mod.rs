// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition backends
//!
//! Components:
//! - `recognition` - PaddleOCR recognition model (ONNX, CPU-only)
//! - `tesseract` - classical engine driven through the `tesseract` executable
//!
//! One backend is chosen at startup and serves the whole process.

pub mod recognition;
pub mod tesseract;

use image::RgbImage;
use serde::{Deserialize, Serialize};

pub use recognition::PaddleOcrRecognizer;
pub use tesseract::TesseractRecognizer;

/// Recognized text with confidence score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    /// The recognized text content
    pub text: String,
    /// Overall confidence score (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Result reported when no backend ran or a backend call failed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Which recognition backend serves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerKind {
    Neural,
    Classical,
    None,
}

impl RecognizerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognizerKind::Neural => "paddleocr",
            RecognizerKind::Classical => "tesseract",
            RecognizerKind::None => "none",
        }
    }
}

impl std::fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts text from a single pre-processed region
pub trait Recognizer: Send + Sync {
    fn kind(&self) -> RecognizerKind;

    fn recognize(&self, region: &RgbImage) -> anyhow::Result<RecognizedText>;
}
