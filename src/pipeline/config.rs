// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request pipeline parameters and their bounds

use thiserror::Error;

use crate::vision::DetectParams;

pub const MIN_CONFIDENCE: f32 = 0.05;
pub const MAX_CONFIDENCE: f32 = 0.95;
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

pub const MIN_INFERENCE_SIZE: u32 = 256;
pub const MAX_INFERENCE_SIZE: u32 = 1280;
pub const DEFAULT_INFERENCE_SIZE: u32 = 640;

/// Upper bound on regions returned by the text path
pub const MAX_TEXT_RESULTS: usize = 10;
pub const DEFAULT_TEXT_RESULTS: usize = 3;

/// Upper bound on regions returned by the detection-only path
pub const MAX_DETECT_RESULTS: usize = 100;
pub const DEFAULT_DETECT_RESULTS: usize = 100;

/// Which entry point a request came through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Detect, crop, pre-process and recognize
    ExtractText,
    /// Detect and rank only; requires the primary detector
    Detect,
}

impl PipelineMode {
    pub fn max_results_limit(&self) -> usize {
        match self {
            PipelineMode::ExtractText => MAX_TEXT_RESULTS,
            PipelineMode::Detect => MAX_DETECT_RESULTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid {field}: {message}")]
pub struct InvalidParameter {
    pub field: &'static str,
    pub message: String,
}

/// Validated knobs for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub confidence_threshold: f32,
    pub inference_size: u32,
    /// Keep only document-like labels
    pub filter_labels: bool,
    /// Attach the `[0, 1]` box form to each region
    pub normalized: bool,
    pub max_results: usize,
}

impl PipelineConfig {
    /// Defaults of the text extraction path
    pub fn for_text() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            inference_size: DEFAULT_INFERENCE_SIZE,
            filter_labels: false,
            normalized: false,
            max_results: DEFAULT_TEXT_RESULTS,
        }
    }

    /// Defaults of the detection-only path
    pub fn for_detection() -> Self {
        Self {
            max_results: DEFAULT_DETECT_RESULTS,
            ..Self::for_text()
        }
    }

    pub fn with_filter_labels(mut self, filter_labels: bool) -> Self {
        self.filter_labels = filter_labels;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Check every bound for the given entry point
    pub fn validate(&self, mode: PipelineMode) -> Result<(), InvalidParameter> {
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.confidence_threshold) {
            return Err(InvalidParameter {
                field: "conf",
                message: format!(
                    "{} is outside [{}, {}]",
                    self.confidence_threshold, MIN_CONFIDENCE, MAX_CONFIDENCE
                ),
            });
        }

        if !(MIN_INFERENCE_SIZE..=MAX_INFERENCE_SIZE).contains(&self.inference_size) {
            return Err(InvalidParameter {
                field: "imgsz",
                message: format!(
                    "{} is outside [{}, {}]",
                    self.inference_size, MIN_INFERENCE_SIZE, MAX_INFERENCE_SIZE
                ),
            });
        }

        let limit = mode.max_results_limit();
        if self.max_results < 1 || self.max_results > limit {
            return Err(InvalidParameter {
                field: "max_results",
                message: format!("{} is outside [1, {}]", self.max_results, limit),
            });
        }

        Ok(())
    }

    pub fn detect_params(&self) -> DetectParams {
        DetectParams {
            confidence_threshold: self.confidence_threshold,
            inference_size: self.inference_size,
        }
    }
}
