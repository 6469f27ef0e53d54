// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection query parameters and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::pipeline::config::{
    DEFAULT_CONFIDENCE, DEFAULT_DETECT_RESULTS, DEFAULT_INFERENCE_SIZE,
};
use crate::pipeline::{PipelineConfig, PipelineMode};

fn default_conf() -> f32 {
    DEFAULT_CONFIDENCE
}

fn default_imgsz() -> u32 {
    DEFAULT_INFERENCE_SIZE
}

fn default_max_results() -> usize {
    DEFAULT_DETECT_RESULTS
}

/// Query string of `/detect` and `/detect_with_image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectQuery {
    /// Minimum detection score
    #[serde(default = "default_conf")]
    pub conf: f32,

    /// Detector input side
    #[serde(default = "default_imgsz")]
    pub imgsz: u32,

    /// Keep only document-like labels
    #[serde(default)]
    pub filter_labels: bool,

    /// Add `[0, 1]` box coordinates
    #[serde(default)]
    pub normalized: bool,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for DetectQuery {
    fn default() -> Self {
        Self {
            conf: default_conf(),
            imgsz: default_imgsz(),
            filter_labels: false,
            normalized: false,
            max_results: default_max_results(),
        }
    }
}

impl DetectQuery {
    /// Validate and convert into a pipeline configuration
    pub fn into_config(self) -> Result<PipelineConfig, ApiError> {
        let config = PipelineConfig {
            confidence_threshold: self.conf,
            inference_size: self.imgsz,
            filter_labels: self.filter_labels,
            normalized: self.normalized,
            max_results: self.max_results,
        };
        config.validate(PipelineMode::Detect)?;
        Ok(config)
    }
}
