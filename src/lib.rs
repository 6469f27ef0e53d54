// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod version;
pub mod vision;

// Re-export main types
pub use config::ServiceConfig;
pub use pipeline::{
    InferenceGate, Orchestrator, PipelineConfig, PipelineError, PipelineMode, PipelineResponse,
    RegionRecord,
};
pub use vision::{
    BackendAvailability, BoundingBox, DetectParams, Detection, Detector, DetectorKind,
    RecognizedText, Recognizer, RecognizerKind, RoiPreprocessor, VisionBackendConfig,
    VisionBackends,
};
