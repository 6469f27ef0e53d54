// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoints

pub mod handler;
pub mod request;

pub use handler::{detect_handler, detect_with_image_handler};
pub use request::DetectQuery;
