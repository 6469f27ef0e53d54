// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline output records

use serde::{Deserialize, Serialize};

use crate::vision::{BoundingBox, NormalizedBox};

/// One detected region, optionally with its recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    #[serde(flatten)]
    pub normalized: Option<NormalizedBox>,
    pub score: f32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recognition_score: Option<f32>,
}

/// Result of one pipeline run
///
/// Always carries `success`; `error` is set only when it is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub success: bool,
    #[serde(default)]
    pub detections: Vec<RegionRecord>,
    #[serde(default)]
    pub image_width: u32,
    #[serde(default)]
    pub image_height: u32,
    pub detector_used: String,
    pub recognizer_used: String,
    pub processing_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the strict detection path found no primary detector
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unavailable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image_base64: Option<String>,
}

impl PipelineResponse {
    pub fn failure(
        error: impl Into<String>,
        detector_used: impl Into<String>,
        recognizer_used: impl Into<String>,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            success: false,
            detections: Vec::new(),
            image_width: 0,
            image_height: 0,
            detector_used: detector_used.into(),
            recognizer_used: recognizer_used.into(),
            processing_time_ms,
            error: Some(error.into()),
            unavailable: false,
            annotated_image_base64: None,
        }
    }

    /// Texts of all regions with non-empty text, in ranking order
    pub fn texts(&self) -> Vec<&str> {
        self.detections
            .iter()
            .filter_map(|d| d.text.as_deref())
            .filter(|t| !t.trim().is_empty())
            .collect()
    }
}
