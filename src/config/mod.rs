// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every option is a command-line flag that falls back to an environment
//! variable (a `.env` file is loaded first by the binary).

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::pipeline::gate::{MAX_INFERENCE_SLOTS, MIN_INFERENCE_SLOTS};
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::VisionBackendConfig;

/// ROI OCR node
#[derive(Parser, Debug, Clone)]
#[command(name = "roi-ocr-node")]
#[command(version)]
#[command(about = "Region-of-interest detection and text extraction service", long_about = None)]
pub struct ServiceConfig {
    /// Address to bind
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "API_PORT", default_value_t = 8001)]
    pub port: u16,

    /// YOLO detector ONNX file
    #[arg(long, env = "DETECTOR_MODEL_PATH", default_value = "./models/yolov8n.onnx")]
    pub detector_model: PathBuf,

    /// Class names for the detector, one per line (COCO when unset)
    #[arg(long, env = "DETECTOR_LABELS_PATH")]
    pub detector_labels: Option<PathBuf>,

    /// Directory holding rec_model.onnx and ppocr_keys_v1.txt
    #[arg(long, env = "OCR_MODEL_DIR", default_value = "./models/paddleocr-onnx")]
    pub ocr_model_dir: PathBuf,

    /// Tesseract executable
    #[arg(long, env = "TESSERACT_BIN", default_value = "tesseract")]
    pub tesseract_bin: PathBuf,

    /// Never use tesseract, even when installed
    #[arg(long, env = "DISABLE_TESSERACT", default_value_t = false)]
    pub disable_tesseract: bool,

    /// Let the contour detector stand in when the primary finds nothing
    #[arg(
        long,
        env = "ENABLE_CLASSICAL_FALLBACK",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub enable_classical_fallback: bool,

    /// Skip ROI enhancement before recognition
    #[arg(long, env = "DISABLE_PREPROCESSING", default_value_t = false)]
    pub disable_preprocessing: bool,

    /// Concurrent inference runs (clamped to 1..=2)
    #[arg(long, env = "INFERENCE_SLOTS", default_value_t = 1)]
    pub inference_slots: usize,

    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = MAX_IMAGE_SIZE)]
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn effective_inference_slots(&self) -> usize {
        self.inference_slots
            .clamp(MIN_INFERENCE_SLOTS, MAX_INFERENCE_SLOTS)
    }

    pub fn backend_config(&self) -> VisionBackendConfig {
        VisionBackendConfig {
            detector_model_path: self.detector_model.clone(),
            detector_labels_path: self.detector_labels.clone(),
            ocr_model_dir: Some(self.ocr_model_dir.clone()),
            tesseract_bin: (!self.disable_tesseract).then(|| self.tesseract_bin.clone()),
            enable_classical_fallback: self.enable_classical_fallback,
            enable_preprocessing: !self.disable_preprocessing,
        }
    }
}
