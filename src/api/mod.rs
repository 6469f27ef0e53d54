// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod extract_text;
pub mod health;
pub mod http_server;
pub mod upload;

pub use detect::{detect_handler, detect_with_image_handler, DetectQuery};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use extract_text::{extract_text_handler, ExtractTextQuery};
pub use health::{health_handler, HealthResponse};
pub use http_server::{create_router, start_server, AppState};
