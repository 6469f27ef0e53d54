// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tesseract recognizer (classical variant)
//!
//! Shells out to the `tesseract` executable with TSV output. Only available
//! when the binary answers `--version` at startup.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::{RecognizedText, Recognizer, RecognizerKind};

/// Page segmentation mode: a single uniform block of text
pub const PAGE_SEG_MODE: u32 = 6;

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: PathBuf,
}

impl TesseractRecognizer {
    /// Probe the executable and build the recognizer
    ///
    /// # Errors
    /// Returns error if the binary cannot be spawned or exits non-zero.
    pub fn probe<P: AsRef<Path>>(binary: P) -> Result<Self> {
        let binary = binary.as_ref().to_path_buf();
        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .with_context(|| format!("Failed to run {}", binary.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} --version exited with {}",
                binary.display(),
                output.status
            );
        }

        // Older releases print the banner on stderr
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        info!(
            "✅ Tesseract available: {}",
            banner.lines().next().unwrap_or("unknown version").trim()
        );

        Ok(Self { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Recognizer for TesseractRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Classical
    }

    fn recognize(&self, region: &RgbImage) -> Result<RecognizedText> {
        if region.width() == 0 || region.height() == 0 {
            return Ok(RecognizedText::empty());
        }

        let tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .context("Failed to create temp file for OCR")?;
        region
            .save_with_format(tmp.path(), ImageFormat::Png)
            .context("Failed to write temp image for OCR")?;

        let output = Command::new(&self.binary)
            .arg(tmp.path())
            .arg("stdout")
            .arg("--psm")
            .arg(PAGE_SEG_MODE.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            anyhow::bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let recognized = parse_tsv(&tsv);
        debug!(
            "Tesseract recognized {} chars (confidence {:.2})",
            recognized.text.len(),
            recognized.confidence
        );
        Ok(recognized)
    }
}

/// Parse tesseract TSV output
///
/// Words (level 5) are joined with spaces inside a line and lines with
/// newlines, in reading order. Confidence is the mean word confidence
/// rescaled to `[0, 1]`; rows with negative confidence are not words.
pub fn parse_tsv(tsv: &str) -> RecognizedText {
    let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<String>> = BTreeMap::new();
    let mut confidences = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let conf: f32 = match cols[10].trim().parse() {
            Ok(c) if c >= 0.0 => c,
            _ => continue,
        };
        let word = cols[11..].join("\t");
        let word = word.trim();
        if word.is_empty() {
            continue;
        }

        let key = |i: usize| cols[i].trim().parse::<u32>().unwrap_or(0);
        lines
            .entry((key(1), key(2), key(3), key(4)))
            .or_default()
            .push(word.to_string());
        confidences.push(conf);
    }

    if confidences.is_empty() {
        return RecognizedText::empty();
    }

    let text = lines
        .values()
        .map(|words| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;

    RecognizedText::new(text, mean / 100.0)
}
