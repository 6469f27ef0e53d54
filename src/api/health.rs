// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Health and readiness

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::version::VERSION_NUMBER;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// "ok" with the detector model loaded, "degraded" otherwise
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    pub num_classes: usize,
    pub detector: String,
    pub fallback: String,
    pub recognizer: String,
    pub inference_slots: usize,
    pub available_slots: usize,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let gate = state.orchestrator.gate();
    let readiness = state
        .orchestrator
        .backends()
        .availability()
        .readiness(gate.slots());

    Json(HealthResponse {
        status: if readiness.model_loaded { "ok" } else { "degraded" }.to_string(),
        version: VERSION_NUMBER.to_string(),
        model_loaded: readiness.model_loaded,
        num_classes: readiness.num_classes,
        detector: readiness.detector,
        fallback: readiness.fallback,
        recognizer: readiness.recognizer,
        inference_slots: readiness.inference_slots,
        available_slots: gate.available_slots(),
    })
}
