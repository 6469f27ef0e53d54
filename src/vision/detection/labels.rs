// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class-name tables and the document-like label allow-list

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Labels treated as text-bearing objects when label filtering is on
pub const DOCUMENT_LABELS: &[&str] = &[
    "book",
    "books",
    "paper",
    "papers",
    "document",
    "documents",
    "notebook",
    "notebooks",
    "magazine",
    "magazines",
    "laptop",
    "laptops",
    "cell phone",
    "phone",
    "phones",
    "tv",
    "screen",
    "screens",
    "monitor",
    "monitors",
];

/// COCO class names, the table shipped with stock YOLO exports
pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Case-insensitive allow-list check
pub fn is_document_like(label: &str) -> bool {
    let lower = label.trim().to_lowercase();
    DOCUMENT_LABELS.iter().any(|l| *l == lower)
}

/// Class id to name table of a detection model
///
/// Sparse by design: a model may emit ids the table does not cover.
#[derive(Debug, Clone, Default)]
pub struct ClassNames {
    names: HashMap<usize, String>,
}

impl ClassNames {
    pub fn coco() -> Self {
        Self::from_names(COCO_CLASSES.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (i, n.into()))
                .collect(),
        }
    }

    /// Load a names file: one class per line, line number is the class id.
    /// Blank lines leave their id unresolved.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read class names from {}", path.display()))?;

        let names = content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let name = line.trim();
                (!name.is_empty()).then(|| (i, name.to_string()))
            })
            .collect();

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a class id. Unknown ids become their decimal string.
    pub fn resolve(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}
