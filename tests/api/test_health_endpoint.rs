// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use roi_ocr_node::api::HealthResponse;
use roi_ocr_node::vision::{Detector, VisionBackends};
use tower::util::ServiceExt;

use crate::common::http::{app, json_body};
use crate::common::{backends, ScriptedDetector};

fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_degraded_without_model() {
    let response = app(VisionBackends::empty())
        .oneshot(health_request())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "degraded");
    assert!(!health.model_loaded);
    assert_eq!(health.detector, "none");
    assert_eq!(health.inference_slots, 1);
    assert_eq!(health.available_slots, 1);
}

#[tokio::test]
async fn test_health_ok_with_model() {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![]));
    let backends = backends(Some(primary), None, None).with_num_classes(80);

    let response = app(backends).oneshot(health_request()).await.unwrap();

    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "ok");
    assert!(health.model_loaded);
    assert_eq!(health.num_classes, 80);
    assert_eq!(health.detector, "yolo");
    assert_eq!(health.recognizer, "none");
}
