// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction endpoint handler

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use super::request::ExtractTextQuery;
use crate::api::detect::handler::status_for;
use crate::api::errors::ApiErrorResponse;
use crate::api::http_server::AppState;
use crate::api::upload::read_image_field;
use crate::pipeline::PipelineResponse;

/// POST /extract_text - Detect regions and recognize the text inside them
///
/// Same multipart upload and query parameters as `/detect`, except that
/// `max_results` is 1-10 (default 3). Regions are returned largest first,
/// each with `text` and `recognition_score`. When no detector is available
/// the response is a success with an empty region list.
///
/// # Errors
/// - 400 Bad Request: parameter out of range, missing image
pub async fn extract_text_handler(
    State(state): State<AppState>,
    Query(query): Query<ExtractTextQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PipelineResponse>), ApiErrorResponse> {
    debug!("Extract text request received: {:?}", query);

    let config = query.into_config().map_err(|e| {
        warn!("Extract text validation failed: {}", e);
        ApiErrorResponse(e)
    })?;
    let image = read_image_field(multipart, state.max_upload_bytes).await?;

    let response = state.orchestrator.extract_text(image, config).await;
    if response.success {
        info!(
            "Text extraction: {} regions, {} with text",
            response.detections.len(),
            response.texts().len()
        );
    }
    Ok((status_for(&response), Json(response)))
}
