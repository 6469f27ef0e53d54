// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use roi_ocr_node::{
    api::{start_server, AppState},
    config::ServiceConfig,
    pipeline::{InferenceGate, Orchestrator},
    version,
    vision::VisionBackends,
};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting ROI OCR Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = ServiceConfig::parse();
    let addr = config.socket_addr()?;

    println!("👁️  Loading vision backends...");
    let backends = Arc::new(VisionBackends::load(config.backend_config()).await);
    let availability = *backends.availability();
    if !availability.primary_detector {
        println!("⚠️  Detector model not loaded - /detect will report 503");
        println!("   Set DETECTOR_MODEL_PATH to a YOLO ONNX export to enable it");
    }

    let gate = InferenceGate::new(config.effective_inference_slots());
    let orchestrator =
        Orchestrator::new(backends, gate).with_max_image_bytes(config.max_upload_bytes);
    let state = AppState::new(orchestrator, config.max_upload_bytes);

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 {} is running", version::get_version_string());
    println!("{}", separator);
    println!("Listen:         http://{}", addr);
    println!("Detector:       {}", availability.detector_kind());
    println!("Recognizer:     {}", availability.recognizer);
    println!("Inference:      {} slot(s)", config.effective_inference_slots());
    println!("\nAPI Endpoints:");
    println!("  GET  /health");
    println!("  POST /detect");
    println!("  POST /detect_with_image");
    println!("  POST /extract_text");
    println!("{}\n", separator);

    start_server(addr, state).await
}
