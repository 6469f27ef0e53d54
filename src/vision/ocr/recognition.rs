// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model (neural variant)
//!
//! Recognizes the text content of one region with a PP-OCR recognition
//! model and greedy CTC decoding.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{RecognizedText, Recognizer, RecognizerKind};
use crate::vision::tensor::preprocess_for_recognition;

/// Model file expected inside the OCR model directory
pub const RECOGNITION_MODEL_FILE: &str = "rec_model.onnx";

/// Character dictionary expected inside the OCR model directory
pub const DICTIONARY_FILE: &str = "ppocr_keys_v1.txt";

/// PaddleOCR text recognition model
///
/// Runs on CPU only.
#[derive(Clone)]
pub struct PaddleOcrRecognizer {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Character dictionary for CTC decoding, blank at index 0
    dictionary: Arc<Vec<char>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for PaddleOcrRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddleOcrRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl PaddleOcrRecognizer {
    /// Load from a model directory holding `rec_model.onnx` and
    /// `ppocr_keys_v1.txt`
    pub fn load_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let dir = model_dir.as_ref();
        Self::load(dir.join(RECOGNITION_MODEL_FILE), dir.join(DICTIONARY_FILE))
    }

    /// Load the recognition model from files
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - Dictionary file not found
    /// - ONNX Runtime initialization fails
    pub fn load<P: AsRef<Path>>(model_path: P, dict_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("OCR recognition model not found: {}", model_path.display());
        }
        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {}",
            model_path.display()
        );

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!(
                    "Failed to load OCR recognition model from {}",
                    model_path.display()
                )
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        debug!("Recognition model loaded - input: {}", input_name);
        info!("✅ OCR recognition model loaded successfully (CPU-only)");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }
}

impl Recognizer for PaddleOcrRecognizer {
    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Neural
    }

    fn recognize(&self, region: &RgbImage) -> Result<RecognizedText> {
        if region.width() == 0 || region.height() == 0 {
            return Ok(RecognizedText::empty());
        }

        let input = preprocess_for_recognition(region);

        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("Recognition session lock poisoned"))?;

            let input_value = Value::from_array(input).context("Failed to create input tensor")?;
            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Recognition inference failed")?;
            let tensor = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract output tensor")?;
            tensor.to_owned()
        };

        debug!("Recognition output shape: {:?}", output.shape());

        let (text, confidence) = ctc_decode(&output.view(), &self.dictionary)?;
        Ok(RecognizedText::new(text, confidence))
    }
}

/// Load character dictionary from file
///
/// One character per line. Index 0 is reserved for the CTC blank and a
/// trailing space class is appended, matching PP-OCR's `use_space_char`.
fn load_dictionary(path: &Path) -> Result<Vec<char>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let reader = BufReader::new(file);
    let mut dictionary = vec!['\0'];

    for line in reader.lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.chars().next() {
            dictionary.push(ch);
        }
    }
    dictionary.push(' ');

    Ok(dictionary)
}

/// Greedy CTC decoding: best class per timestep, repeats collapsed, blanks
/// (index 0) removed. Confidence is the mean probability of emitted
/// characters.
///
/// Accepts `[batch, seq_len, classes]` or `[seq_len, classes]`.
pub fn ctc_decode(output: &ArrayViewD<f32>, dictionary: &[char]) -> Result<(String, f32)> {
    let shape = output.shape();
    let (seq_len, num_classes) = match shape.len() {
        3 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        _ => anyhow::bail!("Unexpected output shape: {:?}", shape),
    };

    let mut text = String::new();
    let mut total_confidence = 0.0f32;
    let mut emitted = 0usize;
    let mut prev_index = 0usize;

    for t in 0..seq_len {
        let mut max_prob = f32::NEG_INFINITY;
        let mut max_index = 0usize;

        for c in 0..num_classes {
            let prob = if shape.len() == 3 {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };
            if prob > max_prob {
                max_prob = prob;
                max_index = c;
            }
        }

        if max_index != 0 && max_index != prev_index {
            if let Some(&ch) = dictionary.get(max_index) {
                text.push(ch);
                total_confidence += max_prob;
                emitted += 1;
            }
        }
        prev_index = max_index;
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        (total_confidence / emitted as f32).clamp(0.0, 1.0)
    };

    Ok((text.trim().to_string(), confidence))
}
