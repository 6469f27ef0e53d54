// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for a running node

use anyhow::{anyhow, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::api::{DetectQuery, ErrorResponse, ExtractTextQuery, HealthResponse};
use crate::pipeline::PipelineResponse;

/// An uploaded image: bytes plus the file name sent with them
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { file_name, data })
    }

    fn part(&self) -> Result<Part> {
        Part::bytes(self.data.clone())
            .file_name(self.file_name.clone())
            .mime_str(guess_mime(&self.file_name))
            .context("Invalid mime type")
    }
}

/// Content type from the file extension
pub fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct NodeClient {
    base_url: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Health request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!("Health check failed: {}", response.status()));
        }
        response.json().await.context("Invalid health response")
    }

    pub async fn detect(&self, upload: &Upload, query: &DetectQuery) -> Result<PipelineResponse> {
        self.post_image("detect", upload, query).await
    }

    pub async fn detect_with_image(
        &self,
        upload: &Upload,
        query: &DetectQuery,
    ) -> Result<PipelineResponse> {
        self.post_image("detect_with_image", upload, query).await
    }

    pub async fn extract_text(
        &self,
        upload: &Upload,
        query: &ExtractTextQuery,
    ) -> Result<PipelineResponse> {
        self.post_image("extract_text", upload, query).await
    }

    async fn post_image<Q: Serialize>(
        &self,
        endpoint: &str,
        upload: &Upload,
        query: &Q,
    ) -> Result<PipelineResponse> {
        let form = Form::new().part("image", upload.part()?);
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, endpoint))
            .query(query)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("POST /{} failed", endpoint))?;

        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;

        // 503 still carries a pipeline body
        if let Ok(parsed) = serde_json::from_str::<PipelineResponse>(&body) {
            return Ok(parsed);
        }
        if let Ok(error) = serde_json::from_str::<ErrorResponse>(&body) {
            return Err(anyhow!("{} ({}): {}", status, error.error_type, error.message));
        }
        Err(anyhow!("{}: {}", status, body))
    }
}

/// Latency summary of repeated requests
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkStats {
    pub runs: usize,
    pub failures: usize,
    pub average: Duration,
    pub fastest: Duration,
    pub slowest: Duration,
    /// Mean server-reported processing time
    pub average_server_ms: f64,
}

impl BenchmarkStats {
    /// `samples` holds (client latency, server ms) for successful runs
    pub fn from_samples(samples: &[(Duration, f64)], failures: usize) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().map(|(d, _)| *d).sum();
        let server: f64 = samples.iter().map(|(_, ms)| ms).sum();
        Some(Self {
            runs: samples.len(),
            failures,
            average: total / samples.len() as u32,
            fastest: samples.iter().map(|(d, _)| *d).min().unwrap_or_default(),
            slowest: samples.iter().map(|(d, _)| *d).max().unwrap_or_default(),
            average_server_ms: server / samples.len() as f64,
        })
    }
}

/// Run `/detect` `runs` times and time each call
pub async fn benchmark(
    client: &NodeClient,
    upload: &Upload,
    query: &DetectQuery,
    runs: usize,
) -> (Vec<(Duration, f64)>, usize) {
    let mut samples = Vec::with_capacity(runs);
    let mut failures = 0;

    for i in 0..runs {
        let started = Instant::now();
        match client.detect(upload, query).await {
            Ok(response) if response.success => {
                let elapsed = started.elapsed();
                println!(
                    "   Test {}: {:.2}s total, {:.1}ms server",
                    i + 1,
                    elapsed.as_secs_f64(),
                    response.processing_time_ms
                );
                samples.push((elapsed, response.processing_time_ms));
            }
            Ok(response) => {
                failures += 1;
                println!(
                    "   Test {}: Failed ({})",
                    i + 1,
                    response.error.unwrap_or_default()
                );
            }
            Err(e) => {
                failures += 1;
                println!("   Test {}: Failed ({})", i + 1, e);
            }
        }
    }

    (samples, failures)
}
