// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Bounded inference concurrency

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use roi_ocr_node::pipeline::PipelineConfig;
use roi_ocr_node::vision::Detector;

use crate::common::{backends, orchestrator, png_bytes, PanickingDetector, SlowDetector};

async fn peak_with_slots(slots: usize, requests: usize) -> usize {
    let detector = Arc::new(SlowDetector::new(Duration::from_millis(40)));
    let orchestrator = Arc::new(orchestrator(
        backends(Some(detector.clone() as Arc<dyn Detector>), None, None),
        slots,
    ));

    let runs = (0..requests).map(|_| {
        let orchestrator = Arc::clone(&orchestrator);
        async move {
            orchestrator
                .extract_text(png_bytes(64, 64), PipelineConfig::for_text())
                .await
        }
    });
    let responses = join_all(runs).await;

    assert!(responses.iter().all(|r| r.success));
    assert_eq!(orchestrator.gate().available_slots(), slots);
    detector.peak()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_slot_serializes_inference() {
    assert_eq!(peak_with_slots(1, 4).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_slots_never_exceeded() {
    assert!(peak_with_slots(2, 6).await <= 2);
}

#[tokio::test]
async fn test_panic_releases_slot() {
    let primary: Arc<dyn Detector> = Arc::new(PanickingDetector);
    let orchestrator = orchestrator(backends(Some(primary), None, None), 1);

    let response = orchestrator
        .extract_text(png_bytes(64, 64), PipelineConfig::for_text())
        .await;

    assert!(!response.success);
    assert!(response.error.is_some());
    assert_eq!(orchestrator.gate().available_slots(), 1);

    // The gate still admits the next request
    let again = orchestrator
        .extract_text(png_bytes(64, 64), PipelineConfig::for_text())
        .await;
    assert!(!again.success);
    assert_eq!(orchestrator.gate().available_slots(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancelled_request_keeps_slot_until_inference_ends() {
    let detector = Arc::new(SlowDetector::new(Duration::from_millis(300)));
    let orchestrator = Arc::new(orchestrator(
        backends(Some(detector.clone() as Arc<dyn Detector>), None, None),
        1,
    ));

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .extract_text(png_bytes(64, 64), PipelineConfig::for_text())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());

    // Blocking work of the dropped request still holds the slot
    assert_eq!(orchestrator.gate().available_slots(), 0);

    let second = orchestrator
        .extract_text(png_bytes(64, 64), PipelineConfig::for_text())
        .await;
    assert!(second.success);
    assert_eq!(detector.peak(), 1);
    assert_eq!(orchestrator.gate().available_slots(), 1);
}
