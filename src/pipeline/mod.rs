// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline: parameters, admission gate, state machine, output

pub mod config;
pub mod errors;
pub mod gate;
pub mod orchestrator;
pub mod response;
pub mod state;

pub use config::{InvalidParameter, PipelineConfig, PipelineMode};
pub use errors::PipelineError;
pub use gate::InferenceGate;
pub use orchestrator::Orchestrator;
pub use response::{PipelineResponse, RegionRecord};
pub use state::{PipelineState, StateTrace};
