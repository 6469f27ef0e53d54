// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end runs of the orchestrator against scripted backends

use std::sync::Arc;

use bytes::Bytes;
use roi_ocr_node::pipeline::PipelineConfig;
use roi_ocr_node::vision::{Detector, Recognizer, RoiPreprocessor, VisionBackends};

use crate::common::{
    backends, detection, orchestrator, png_bytes, FixedRecognizer, ScriptedDetector,
};

#[tokio::test]
async fn test_single_region_is_recognized() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        100.0, 80.0, 400.0, 300.0, 0.8, "book",
    )]));
    let recognizer: Arc<dyn Recognizer> = Arc::new(FixedRecognizer::new("Chapter One", 0.91));
    let orchestrator = orchestrator(backends(Some(primary), None, Some(recognizer)), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success, "unexpected failure: {:?}", response.error);
    assert_eq!(response.image_width, 640);
    assert_eq!(response.image_height, 480);
    assert_eq!(response.detections.len(), 1);

    let region = &response.detections[0];
    assert_eq!(region.label, "book");
    assert_eq!(region.text.as_deref(), Some("Chapter One"));
    assert_eq!(region.recognition_score, Some(0.91));
    assert_eq!(response.detector_used, "yolo");
    assert_eq!(response.recognizer_used, "paddleocr");
    assert_eq!(response.texts(), vec!["Chapter One"]);
}

#[tokio::test]
async fn test_enhanced_region_still_yields_text_field() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        100.0, 80.0, 400.0, 300.0, 0.8, "book",
    )]));
    let backends = VisionBackends::new(Some(primary), None, None, RoiPreprocessor::default());
    let orchestrator = orchestrator(backends, 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.detections.len(), 1);
    // No recognizer: text is empty, never absent
    assert_eq!(response.detections[0].text.as_deref(), Some(""));
    assert_eq!(response.recognizer_used, "none");
}

#[tokio::test]
async fn test_corrupt_bytes_fail_cleanly() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .extract_text(
            Bytes::from_static(b"definitely not an image"),
            PipelineConfig::for_text(),
        )
        .await;

    assert!(!response.success);
    assert!(response.detections.is_empty());
    assert!(!response.error.unwrap_or_default().is_empty());
    assert_eq!(orchestrator.gate().available_slots(), 1);
}

#[tokio::test]
async fn test_empty_body_fails_cleanly() {
    let orchestrator = orchestrator(VisionBackends::empty(), 1);

    let response = orchestrator
        .extract_text(Bytes::new(), PipelineConfig::for_text())
        .await;

    assert!(!response.success);
    assert!(response.error.is_some());
}

#[tokio::test]
async fn test_no_detectors_yields_empty_success() {
    let orchestrator = orchestrator(VisionBackends::empty(), 1);

    let response = orchestrator
        .extract_text(png_bytes(320, 240), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert!(response.detections.is_empty());
    assert_eq!(response.detector_used, "none");
    assert_eq!(response.image_width, 320);
}

#[tokio::test]
async fn test_only_largest_region_processed() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        // area 500
        detection(10.0, 10.0, 20.0, 25.0, 0.9, "book"),
        // area 2000
        detection(200.0, 150.0, 40.0, 50.0, 0.6, "book"),
    ]));
    let recognizer = Arc::new(FixedRecognizer::new("largest", 0.8));
    let orchestrator = orchestrator(
        backends(
            Some(primary),
            None,
            Some(recognizer.clone() as Arc<dyn Recognizer>),
        ),
        1,
    );

    let config = PipelineConfig::for_text().with_max_results(1);
    let response = orchestrator.extract_text(png_bytes(640, 480), config).await;

    assert!(response.success);
    assert_eq!(response.detections.len(), 1);
    assert_eq!(response.detections[0].bbox.width, 40.0);
    assert_eq!(response.detections[0].bbox.height, 50.0);
    assert_eq!(recognizer.seen(), vec![(40, 50)]);
}

#[tokio::test]
async fn test_detect_orders_by_area_and_normalizes() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        detection(0.0, 0.0, 10.0, 10.0, 0.9, "cup"),
        detection(0.0, 0.0, 320.0, 240.0, 0.5, "laptop"),
    ]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let mut config = PipelineConfig::for_detection();
    config.normalized = true;
    let response = orchestrator.detect(png_bytes(640, 480), config).await;

    assert!(response.success);
    assert_eq!(response.recognizer_used, "none");
    assert_eq!(response.detections.len(), 2);
    assert_eq!(response.detections[0].label, "laptop");
    assert!(response.detections.iter().all(|d| d.text.is_none()));

    let normalized = response.detections[0].normalized.unwrap();
    assert!((normalized.nwidth - 0.5).abs() < 1e-6);
    assert!((normalized.nheight - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn test_label_filter_keeps_document_like() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        detection(10.0, 10.0, 100.0, 100.0, 0.9, "person"),
        detection(200.0, 200.0, 50.0, 50.0, 0.9, "book"),
    ]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let config = PipelineConfig::for_detection().with_filter_labels(true);
    let response = orchestrator.detect(png_bytes(640, 480), config).await;

    assert!(response.success);
    assert_eq!(response.detections.len(), 1);
    assert_eq!(response.detections[0].label, "book");
}

#[tokio::test]
async fn test_boxes_clamped_and_degenerate_dropped() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        // spills past the right edge
        detection(600.0, 400.0, 100.0, 100.0, 0.9, "book"),
        // entirely outside
        detection(700.0, 500.0, 30.0, 30.0, 0.9, "book"),
        // too thin
        detection(10.0, 10.0, 1.0, 50.0, 0.9, "book"),
    ]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .detect(png_bytes(640, 480), PipelineConfig::for_detection())
        .await;

    assert!(response.success);
    assert_eq!(response.detections.len(), 1);
    let bbox = response.detections[0].bbox;
    assert!(bbox.x + bbox.width <= 640.0);
    assert!(bbox.y + bbox.height <= 480.0);
}

#[tokio::test]
async fn test_detect_without_primary_is_unavailable() {
    let fallback: Arc<dyn Detector> = Arc::new(ScriptedDetector::fallback(vec![detection(
        0.0, 0.0, 100.0, 100.0, 0.5, "document",
    )]));
    let orchestrator = orchestrator(backends(None, Some(fallback), None), 1);

    let response = orchestrator
        .detect(png_bytes(640, 480), PipelineConfig::for_detection())
        .await;

    assert!(!response.success);
    assert!(response.unavailable);
    assert_eq!(response.error.as_deref(), Some("Model not available"));
    assert_eq!(response.detector_used, "none");
}

#[tokio::test]
async fn test_annotated_detection_returns_png() {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        50.0, 50.0, 100.0, 80.0, 0.7, "book",
    )]));
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .detect_annotated(png_bytes(320, 240), PipelineConfig::for_detection())
        .await;

    assert!(response.success);
    let encoded = response.annotated_image_base64.expect("annotated image");
    let png = STANDARD.decode(encoded).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}
