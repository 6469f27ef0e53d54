// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded admission for inference work
//!
//! A counting semaphore with one or two permits. Holding a permit is the
//! only way to run a pipeline; the permit is released when dropped, on
//! every exit path.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::errors::PipelineError;

pub const MIN_INFERENCE_SLOTS: usize = 1;
pub const MAX_INFERENCE_SLOTS: usize = 2;

#[derive(Debug, Clone)]
pub struct InferenceGate {
    semaphore: Arc<Semaphore>,
    slots: usize,
}

impl Default for InferenceGate {
    fn default() -> Self {
        Self::new(MIN_INFERENCE_SLOTS)
    }
}

impl InferenceGate {
    /// Build a gate; `slots` is clamped to `[1, 2]`
    pub fn new(slots: usize) -> Self {
        let slots = slots.clamp(MIN_INFERENCE_SLOTS, MAX_INFERENCE_SLOTS);
        Self {
            semaphore: Arc::new(Semaphore::new(slots)),
            slots,
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, PipelineError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::Internal("inference gate closed".to_string()))
    }

    /// Configured capacity
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Slots free right now
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}
