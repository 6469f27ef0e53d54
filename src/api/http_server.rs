// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::detect::{detect_handler, detect_with_image_handler};
use super::extract_text::extract_text_handler;
use super::health::health_handler;
use crate::pipeline::Orchestrator;

/// Headroom for multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, max_upload_bytes: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            max_upload_bytes,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Detection
        .route("/detect", post(detect_handler))
        .route("/detect_with_image", post(detect_with_image_handler))
        // Detection + recognition
        .route("/extract_text", post(extract_text_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
