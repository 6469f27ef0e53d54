// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Classical fallback selection

use std::sync::Arc;

use image::RgbImage;
use mockall::mock;
use roi_ocr_node::pipeline::PipelineConfig;
use roi_ocr_node::vision::detection::ContourDetector;
use roi_ocr_node::vision::{DetectParams, Detection, Detector, DetectorKind};

use crate::common::{
    backends, detection, orchestrator, png_bytes, FailingDetector, ScriptedDetector,
};

mock! {
    pub Fallback {}

    impl Detector for Fallback {
        fn kind(&self) -> DetectorKind;
        fn detect(&self, image: &RgbImage, params: &DetectParams) -> anyhow::Result<Vec<Detection>>;
    }
}

fn fallback_expecting(calls: usize) -> MockFallback {
    let mut fallback = MockFallback::new();
    fallback.expect_kind().return_const(DetectorKind::Classical);
    fallback
        .expect_detect()
        .times(calls)
        .returning(|_, _| Ok(vec![detection(40.0, 40.0, 200.0, 150.0, 0.5, "document")]));
    fallback
}

#[tokio::test]
async fn test_fallback_runs_once_when_primary_finds_nothing() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![]));
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(1));
    let orchestrator = orchestrator(backends(Some(primary), Some(fallback), None), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.detector_used, "contour");
    assert_eq!(response.detections.len(), 1);
    assert_eq!(response.detections[0].label, "document");
}

#[tokio::test]
async fn test_fallback_not_called_when_primary_has_results() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        10.0, 10.0, 300.0, 200.0, 0.8, "book",
    )]));
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(0));
    let orchestrator = orchestrator(backends(Some(primary), Some(fallback), None), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.detector_used, "yolo");
    assert_eq!(response.detections[0].label, "book");
}

#[tokio::test]
async fn test_fallback_when_all_primary_scores_below_threshold() {
    let primary = Arc::new(ScriptedDetector::primary(vec![detection(
        10.0, 10.0, 300.0, 200.0, 0.8, "book",
    )]));
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(1));
    let orchestrator = orchestrator(
        backends(
            Some(primary.clone() as Arc<dyn Detector>),
            Some(fallback),
            None,
        ),
        1,
    );

    let mut config = PipelineConfig::for_text();
    config.confidence_threshold = 0.9;
    let response = orchestrator.extract_text(png_bytes(640, 480), config).await;

    assert!(response.success);
    assert_eq!(primary.calls(), 1);
    assert_eq!(response.detector_used, "contour");
    // The fixed 0.5 fallback score is held to the same threshold
    assert!(response.detections.is_empty());
}

#[tokio::test]
async fn test_fallback_region_kept_at_its_own_score() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![detection(
        10.0, 10.0, 300.0, 200.0, 0.3, "book",
    )]));
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(1));
    let orchestrator = orchestrator(backends(Some(primary), Some(fallback), None), 1);

    let mut config = PipelineConfig::for_text();
    config.confidence_threshold = 0.5;
    let response = orchestrator.extract_text(png_bytes(640, 480), config).await;

    assert!(response.success);
    assert_eq!(response.detector_used, "contour");
    assert_eq!(response.detections.len(), 1);
    assert_eq!(response.detections[0].score, 0.5);
}

#[tokio::test]
async fn test_fallback_after_primary_fault() {
    let primary: Arc<dyn Detector> = Arc::new(FailingDetector);
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(1));
    let orchestrator = orchestrator(backends(Some(primary), Some(fallback), None), 1);

    let response = orchestrator
        .detect(png_bytes(640, 480), PipelineConfig::for_detection())
        .await;

    assert!(response.success);
    assert_eq!(response.detector_used, "contour");
    assert_eq!(response.detections.len(), 1);
}

#[tokio::test]
async fn test_primary_fault_without_fallback_is_empty_success() {
    let primary: Arc<dyn Detector> = Arc::new(FailingDetector);
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert!(response.detections.is_empty());
    assert_eq!(response.detector_used, "yolo");
}

#[tokio::test]
async fn test_fallback_only_text_extraction() {
    let fallback: Arc<dyn Detector> = Arc::new(fallback_expecting(1));
    let orchestrator = orchestrator(backends(None, Some(fallback), None), 1);

    let response = orchestrator
        .extract_text(png_bytes(640, 480), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.detector_used, "contour");
    assert_eq!(response.detections.len(), 1);
}

#[tokio::test]
async fn test_real_contour_fallback_finds_page() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![]));
    let fallback: Arc<dyn Detector> = Arc::new(ContourDetector::new());
    let orchestrator = orchestrator(backends(Some(primary), Some(fallback), None), 1);

    let response = orchestrator
        .extract_text(png_bytes(400, 300), PipelineConfig::for_text())
        .await;

    assert!(response.success);
    assert_eq!(response.detector_used, "contour");
    assert_eq!(response.detections.len(), 1);
    let region = &response.detections[0];
    assert_eq!(region.score, 0.5);
    // Dark block spans the middle half of the image
    assert!(region.bbox.width > 150.0 && region.bbox.width < 250.0);
    assert!(region.bbox.height > 110.0 && region.bbox.height < 190.0);
}
