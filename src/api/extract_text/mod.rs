// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction endpoint

pub mod handler;
pub mod request;

pub use handler::extract_text_handler;
pub use request::ExtractTextQuery;
