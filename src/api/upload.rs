// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart image upload extraction

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use super::errors::ApiError;

/// Form field carrying the image file
pub const IMAGE_FIELD: &str = "image";

/// Pull the `image` field out of a multipart body
///
/// Other fields are ignored. A missing or empty file is a validation error.
pub async fn read_image_field(mut multipart: Multipart, limit: usize) -> Result<Bytes, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e.status(), e.body_text(), limit)),
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e.status(), e.body_text(), limit))?;

        if data.is_empty() {
            return Err(ApiError::ValidationError {
                field: IMAGE_FIELD.to_string(),
                message: "image file is empty".to_string(),
            });
        }
        if data.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }

        debug!(
            "Received upload {:?}: {} bytes",
            file_name.as_deref().unwrap_or("<unnamed>"),
            data.len()
        );
        return Ok(data);
    }

    Err(ApiError::ValidationError {
        field: IMAGE_FIELD.to_string(),
        message: "image file is required".to_string(),
    })
}

fn multipart_error(status: StatusCode, message: String, limit: usize) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidRequest(format!("Malformed multipart body: {}", message))
    }
}
