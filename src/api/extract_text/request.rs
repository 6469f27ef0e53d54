// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction query parameters and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::pipeline::config::{DEFAULT_CONFIDENCE, DEFAULT_INFERENCE_SIZE, DEFAULT_TEXT_RESULTS};
use crate::pipeline::{PipelineConfig, PipelineMode};

fn default_conf() -> f32 {
    DEFAULT_CONFIDENCE
}

fn default_imgsz() -> u32 {
    DEFAULT_INFERENCE_SIZE
}

fn default_max_results() -> usize {
    DEFAULT_TEXT_RESULTS
}

/// Query string of `/extract_text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTextQuery {
    #[serde(default = "default_conf")]
    pub conf: f32,

    #[serde(default = "default_imgsz")]
    pub imgsz: u32,

    /// Keep only document-like labels
    #[serde(default)]
    pub filter_labels: bool,

    #[serde(default)]
    pub normalized: bool,

    /// Regions to recognize, largest first
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ExtractTextQuery {
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

impl ExtractTextQuery {
    pub fn into_config(self) -> Result<PipelineConfig, ApiError> {
        let config = PipelineConfig {
            confidence_threshold: self.conf,
            inference_size: self.imgsz,
            filter_labels: self.filter_labels,
            normalized: self.normalized,
            max_results: self.max_results,
        };
        config.validate(PipelineMode::ExtractText)?;
        Ok(config)
    }
}
