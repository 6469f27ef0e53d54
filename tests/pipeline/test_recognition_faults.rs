// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Recognition faults stay local to their region

use std::sync::Arc;

use roi_ocr_node::pipeline::PipelineConfig;
use roi_ocr_node::vision::{Detector, Recognizer};

use crate::common::{
    backends, detection, orchestrator, png_bytes, FailingRecognizer, ScriptedDetector,
};

#[tokio::test]
async fn test_failing_recognizer_yields_empty_text() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        detection(10.0, 10.0, 200.0, 100.0, 0.9, "book"),
        detection(300.0, 200.0, 100.0, 100.0, 0.9, "paper"),
    ]));
    let recognizer: Arc<dyn Recognizer> = Arc::new(FailingRecognizer);
    let orchestrator = orchestrator(backends(Some(primary), None, Some(recognizer)), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.recognizer_used, "tesseract");
    assert_eq!(response.detections.len(), 2);
    for region in &response.detections {
        assert_eq!(region.text.as_deref(), Some(""));
        assert_eq!(region.recognition_score, Some(0.0));
    }
    assert!(response.texts().is_empty());
}

#[tokio::test]
async fn test_no_recognizer_reports_none() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        10.0, 10.0, 200.0, 100.0, 0.9, "book",
    )]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.recognizer_used, "none");
    assert_eq!(response.detections[0].text.as_deref(), Some(""));
}
