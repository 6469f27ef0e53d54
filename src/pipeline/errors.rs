// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline fault taxonomy

use thiserror::Error;

use crate::vision::{DetectorKind, ImageError, RecognizerKind};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unreadable or corrupt image bytes; ends the request
    #[error("Failed to decode image: {0}")]
    DecodeFailure(#[from] ImageError),

    /// The capability a strict entry point needs was never initialized
    #[error("Model not available")]
    ModelUnavailable,

    /// A single detector call failed; degrades to fallback or empty result
    #[error("{detector} detector failed: {message}")]
    DetectionBackendFault {
        detector: DetectorKind,
        message: String,
    },

    /// A box collapsed during clamping; the region is skipped
    #[error("Region {index} is degenerate after clamping")]
    DegenerateRegion { index: usize },

    /// A single region's recognition failed; that region gets empty text
    #[error("{recognizer} recognizer failed on region {index}: {message}")]
    RecognitionBackendFault {
        recognizer: RecognizerKind,
        index: usize,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Whether the fault ends the request with `success = false`
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::DecodeFailure(_)
                | PipelineError::ModelUnavailable
                | PipelineError::Internal(_)
        )
    }
}
