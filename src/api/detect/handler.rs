// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use tracing::{debug, warn};

use super::request::DetectQuery;
use crate::api::errors::ApiErrorResponse;
use crate::api::http_server::AppState;
use crate::api::upload::read_image_field;
use crate::pipeline::PipelineResponse;

/// POST /detect - Locate text-bearing objects in an uploaded image
///
/// # Request
/// Multipart form with an `image` file field. Query parameters:
/// - `conf`: minimum score, 0.05-0.95 (default 0.25)
/// - `imgsz`: detector input side, 256-1280 (default 640)
/// - `filter_labels`: keep document-like labels only (default false)
/// - `normalized`: add `[0, 1]` coordinates (default false)
/// - `max_results`: 1-100 (default 100)
///
/// # Errors
/// - 400 Bad Request: parameter out of range, missing image
/// - 503 Service Unavailable: detector model not loaded
pub async fn detect_handler(
    State(state): State<AppState>,
    Query(query): Query<DetectQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiErrorResponse> {
    debug!("Detect request received: {:?}", query);

    let config = query.into_config().map_err(|e| {
        warn!("Detect validation failed: {}", e);
        ApiErrorResponse(e)
    })?;
    let image = read_image_field(multipart, state.max_upload_bytes).await?;

    let response = state.orchestrator.detect(image, config).await;
    Ok((status_for(&response), Json(response)))
}

/// POST /detect_with_image - As `/detect`, plus `annotated_image_base64`
pub async fn detect_with_image_handler(
    State(state): State<AppState>,
    Query(query): Query<DetectQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiErrorResponse> {
    debug!("Annotated detect request received: {:?}", query);

    let config = query.into_config().map_err(|e| {
        warn!("Annotated detect validation failed: {}", e);
        ApiErrorResponse(e)
    })?;
    let image = read_image_field(multipart, state.max_upload_bytes).await?;

    let response = state.orchestrator.detect_annotated(image, config).await;
    Ok((status_for(&response), Json(response)))
}

/// Pipeline failures stay in the body; only missing models change the status
pub(crate) fn status_for(response: &PipelineResponse) -> StatusCode {
    if response.unavailable {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}
