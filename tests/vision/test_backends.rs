// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Backend selection at startup

use std::path::PathBuf;

use roi_ocr_node::vision::{DetectorKind, RecognizerKind, VisionBackendConfig, VisionBackends};

fn missing_models() -> VisionBackendConfig {
    VisionBackendConfig {
        detector_model_path: PathBuf::from("/nonexistent/yolov8n.onnx"),
        detector_labels_path: None,
        ocr_model_dir: Some(PathBuf::from("/nonexistent/paddleocr-onnx")),
        tesseract_bin: Some(PathBuf::from("/nonexistent/bin/tesseract")),
        enable_classical_fallback: true,
        enable_preprocessing: true,
    }
}

#[tokio::test]
async fn test_missing_models_degrade_to_fallback() {
    let backends = VisionBackends::load(missing_models()).await;
    let availability = backends.availability();

    assert!(!availability.primary_detector);
    assert!(availability.classical_fallback);
    assert_eq!(availability.recognizer, RecognizerKind::None);
    assert_eq!(availability.detector_kind(), DetectorKind::Classical);
    assert_eq!(availability.num_classes, 0);
    assert!(backends.primary().is_none());
    assert!(backends.fallback().is_some());
    assert!(backends.preprocessor().is_available());
}

#[tokio::test]
async fn test_everything_disabled() {
    let config = VisionBackendConfig {
        ocr_model_dir: None,
        tesseract_bin: None,
        enable_classical_fallback: false,
        enable_preprocessing: false,
        ..missing_models()
    };
    let backends = VisionBackends::load(config).await;
    let readiness = backends.availability().readiness(1);

    assert!(!readiness.model_loaded);
    assert_eq!(readiness.detector, "none");
    assert_eq!(readiness.fallback, "none");
    assert_eq!(readiness.recognizer, "none");
    assert_eq!(readiness.inference_slots, 1);
    assert!(!backends.preprocessor().is_available());
}
