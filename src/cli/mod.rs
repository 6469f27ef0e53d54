// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod client;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::api::{DetectQuery, ExtractTextQuery};
use crate::pipeline::config::{DEFAULT_CONFIDENCE, DEFAULT_INFERENCE_SIZE};
use crate::pipeline::PipelineResponse;
use client::{benchmark, BenchmarkStats, NodeClient, Upload};

/// ROI OCR node CLI
#[derive(Parser, Debug)]
#[command(name = "roi-cli")]
#[command(version = "1.0.0")]
#[command(about = "Client tools for a running ROI OCR node", long_about = None)]
pub struct Cli {
    /// Base URL of the node
    #[arg(long, global = true, env = "ROI_NODE_URL", default_value = "http://127.0.0.1:8001")]
    pub url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show node readiness
    Health,

    /// Detect regions in an image
    Detect(DetectArgs),

    /// Detect regions and save the annotated image
    DetectImage(DetectImageArgs),

    /// Detect regions and read their text
    Extract(ExtractArgs),

    /// Time repeated detection requests
    Benchmark(BenchmarkArgs),
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Minimum detection score
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub conf: f32,

    /// Detector input side
    #[arg(long, default_value_t = DEFAULT_INFERENCE_SIZE)]
    pub imgsz: u32,

    /// Keep only document-like labels
    #[arg(long)]
    pub filter_labels: bool,

    /// Ask for `[0, 1]` coordinates as well
    #[arg(long)]
    pub normalized: bool,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    pub image: PathBuf,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Detections to print
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Args, Debug)]
pub struct DetectImageArgs {
    pub image: PathBuf,

    /// Where to write the annotated PNG
    #[arg(long, default_value = "annotated.png")]
    pub out: PathBuf,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    pub image: PathBuf,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Regions to recognize
    #[arg(long, default_value_t = 3)]
    pub max_results: usize,
}

#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    pub image: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub runs: usize,

    #[command(flatten)]
    pub query: QueryArgs,
}

impl QueryArgs {
    pub fn detect_query(&self) -> DetectQuery {
        DetectQuery {
            conf: self.conf,
            imgsz: self.imgsz,
            filter_labels: self.filter_labels,
            normalized: self.normalized,
            ..Default::default()
        }
    }

    pub fn extract_query(&self, max_results: usize) -> ExtractTextQuery {
        ExtractTextQuery {
            conf: self.conf,
            imgsz: self.imgsz,
            filter_labels: self.filter_labels,
            normalized: self.normalized,
            max_results,
        }
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let client = NodeClient::new(cli.url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Health => health(&client).await,
        Commands::Detect(args) => detect(&client, args).await,
        Commands::DetectImage(args) => detect_image(&client, args).await,
        Commands::Extract(args) => extract(&client, args).await,
        Commands::Benchmark(args) => run_benchmark(&client, args).await,
    }
}

async fn health(client: &NodeClient) -> Result<()> {
    println!("🔍 Checking {}", client.base_url());
    let health = client.health().await?;

    println!("✅ Status: {}", health.status);
    println!("   Version: {}", health.version);
    println!("   Model loaded: {}", health.model_loaded);
    println!("   Classes: {}", health.num_classes);
    println!("   Detector: {}", health.detector);
    println!("   Fallback: {}", health.fallback);
    println!("   Recognizer: {}", health.recognizer);
    println!(
        "   Inference slots: {}/{} free",
        health.available_slots, health.inference_slots
    );
    Ok(())
}

async fn detect(client: &NodeClient, args: DetectArgs) -> Result<()> {
    let upload = Upload::from_path(&args.image)?;
    let started = Instant::now();
    let response = client.detect(&upload, &args.query.detect_query()).await?;
    let elapsed = started.elapsed();

    ensure_success(&response)?;
    print_summary(&response, elapsed);
    for (i, det) in response.detections.iter().take(args.top).enumerate() {
        println!(
            "   {}. {} ({:.3}) at [{:.0}, {:.0}, {:.0}x{:.0}]",
            i + 1,
            det.label,
            det.score,
            det.bbox.x,
            det.bbox.y,
            det.bbox.width,
            det.bbox.height
        );
    }
    Ok(())
}

async fn detect_image(client: &NodeClient, args: DetectImageArgs) -> Result<()> {
    let upload = Upload::from_path(&args.image)?;
    let started = Instant::now();
    let response = client
        .detect_with_image(&upload, &args.query.detect_query())
        .await?;
    let elapsed = started.elapsed();

    ensure_success(&response)?;
    print_summary(&response, elapsed);

    let encoded = response
        .annotated_image_base64
        .as_deref()
        .context("Response carries no annotated image")?;
    let png = STANDARD
        .decode(encoded)
        .context("Annotated image is not valid base64")?;
    std::fs::write(&args.out, &png)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("💾 Annotated image saved to {}", args.out.display());
    Ok(())
}

async fn extract(client: &NodeClient, args: ExtractArgs) -> Result<()> {
    let upload = Upload::from_path(&args.image)?;
    let started = Instant::now();
    let response = client
        .extract_text(&upload, &args.query.extract_query(args.max_results))
        .await?;
    let elapsed = started.elapsed();

    ensure_success(&response)?;
    print_summary(&response, elapsed);
    for (i, det) in response.detections.iter().enumerate() {
        let text = det.text.as_deref().unwrap_or("");
        println!(
            "   {}. {} ({:.3}): {:?}",
            i + 1,
            det.label,
            det.recognition_score.unwrap_or(0.0),
            text
        );
    }
    Ok(())
}

async fn run_benchmark(client: &NodeClient, args: BenchmarkArgs) -> Result<()> {
    let upload = Upload::from_path(&args.image)?;
    println!(
        "⏱️  Benchmark started {} ({} runs against {})",
        chrono::Utc::now().to_rfc3339(),
        args.runs,
        client.base_url()
    );

    let (samples, failures) =
        benchmark(client, &upload, &args.query.detect_query(), args.runs).await;
    let stats = BenchmarkStats::from_samples(&samples, failures)
        .context("Every benchmark run failed")?;

    println!("📊 Results ({} ok, {} failed):", stats.runs, stats.failures);
    println!("   Average: {:.2}s", stats.average.as_secs_f64());
    println!("   Fastest: {:.2}s", stats.fastest.as_secs_f64());
    println!("   Slowest: {:.2}s", stats.slowest.as_secs_f64());
    println!("   Server average: {:.1}ms", stats.average_server_ms);
    Ok(())
}

fn ensure_success(response: &PipelineResponse) -> Result<()> {
    if response.success {
        return Ok(());
    }
    anyhow::bail!(
        "{}",
        response.error.as_deref().unwrap_or("request failed")
    )
}

fn print_summary(response: &PipelineResponse, elapsed: Duration) {
    println!(
        "✅ {} regions in {}x{} image ({} / {})",
        response.detections.len(),
        response.image_width,
        response.image_height,
        response.detector_used,
        response.recognizer_used
    );
    println!(
        "   {:.2}s total, {:.1}ms server",
        elapsed.as_secs_f64(),
        response.processing_time_ms
    );
}
