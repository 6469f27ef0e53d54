// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router fixtures for handler tests

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response},
    Router,
};
use roi_ocr_node::api::{create_router, AppState};
use roi_ocr_node::vision::image_utils::MAX_IMAGE_SIZE;
use roi_ocr_node::vision::VisionBackends;

use super::orchestrator;

pub const BOUNDARY: &str = "roi-test-boundary";

pub fn app(backends: VisionBackends) -> Router {
    app_with_limit(backends, MAX_IMAGE_SIZE)
}

pub fn app_with_limit(backends: VisionBackends, max_upload_bytes: usize) -> Router {
    let orchestrator = orchestrator(backends, 1).with_max_image_bytes(max_upload_bytes);
    create_router(AppState::new(orchestrator, max_upload_bytes))
}

/// Multipart body with a single file field
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, "page.png", data)))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
