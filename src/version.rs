// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the ROI OCR Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-roi-text-extraction-2025-10-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Major version number
pub const VERSION_MAJOR: u32 = 1;

/// Minor version number
pub const VERSION_MINOR: u32 = 0;

/// Patch version number
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-10-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "yolo-detection",
    "contour-fallback",
    "roi-preprocessing",
    "paddleocr-recognition",
    "tesseract-recognition",
    "annotated-images",
    "normalized-boxes",
    "inference-gate",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("ROI OCR Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
