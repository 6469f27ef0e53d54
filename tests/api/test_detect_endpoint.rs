// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect and /detect_with_image

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use roi_ocr_node::vision::{Detector, VisionBackends};
use tower::util::ServiceExt; // for `oneshot`

use crate::common::http::{app, app_with_limit, json_body, upload_request};
use crate::common::{backends, detection, png_bytes, ScriptedDetector};

fn detecting_backends() -> VisionBackends {
    let primary: Arc<dyn Detector> = Arc::new(ScriptedDetector::primary(vec![
        detection(20.0, 20.0, 200.0, 150.0, 0.85, "book"),
        detection(300.0, 100.0, 50.0, 50.0, 0.6, "person"),
    ]));
    backends(Some(primary), None, None)
}

#[tokio::test]
async fn test_detect_returns_boxes() {
    let response = app(detecting_backends())
        .oneshot(upload_request("/detect", "image", &png_bytes(640, 480)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["detector_used"], "yolo");
    assert_eq!(body["image_width"], 640);
    assert_eq!(body["detections"].as_array().unwrap().len(), 2);
    assert_eq!(body["detections"][0]["label"], "book");
    assert_eq!(body["detections"][0]["width"], 200.0);
    assert!(body["detections"][0].get("nx").is_none());
    assert!(body.get("annotated_image_base64").is_none());
}

#[tokio::test]
async fn test_detect_normalized_and_filtered() {
    let response = app(detecting_backends())
        .oneshot(upload_request(
            "/detect?normalized=true&filter_labels=true",
            "image",
            &png_bytes(640, 480),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let detections = body["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 1);
    let nwidth = detections[0]["nwidth"].as_f64().unwrap();
    assert!((nwidth - 200.0 / 640.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_detect_without_model_is_503() {
    let response = app(VisionBackends::empty())
        .oneshot(upload_request("/detect", "image", &png_bytes(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model not available");
}

#[tokio::test]
async fn test_confidence_out_of_range_is_400() {
    let response = app(detecting_backends())
        .oneshot(upload_request("/detect?conf=0.99", "image", &png_bytes(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "conf");
}

#[tokio::test]
async fn test_imgsz_out_of_range_is_400() {
    for uri in ["/detect?imgsz=2048", "/detect_with_image?imgsz=2048"] {
        let response = app(detecting_backends())
            .oneshot(upload_request(uri, "image", &png_bytes(64, 64)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["error_type"], "validation_error");
        assert_eq!(body["details"]["field"], "imgsz");
    }
}

#[tokio::test]
async fn test_missing_image_field_is_400() {
    let response = app(detecting_backends())
        .oneshot(upload_request("/detect", "file", &png_bytes(64, 64)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["details"]["field"], "image");
}

#[tokio::test]
async fn test_oversized_upload_is_413() {
    let response = app_with_limit(detecting_backends(), 256)
        .oneshot(upload_request("/detect", "image", &png_bytes(640, 480)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_corrupt_upload_stays_200() {
    let response = app(detecting_backends())
        .oneshot(upload_request("/detect", "image", b"not an image at all"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_detect_with_image_includes_png() {
    let response = app(detecting_backends())
        .oneshot(upload_request(
            "/detect_with_image",
            "image",
            &png_bytes(640, 480),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let encoded = body["annotated_image_base64"].as_str().unwrap();
    assert!(!encoded.is_empty());
}

#[tokio::test]
async fn test_get_detect_not_allowed() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/detect")
        .body(Body::empty())
        .unwrap();

    let response = app(detecting_backends()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
