// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline states and transition tracing

use std::fmt;

use tracing::{debug, warn};
use uuid::Uuid;

/// Stage a request has reached; the index is the ROI being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ImageDecoded,
    Detected,
    Filtered,
    Ranked,
    Cropped(usize),
    PreProcessed(usize),
    Recognized(usize),
    Assembled,
    Done,
    Error,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::ImageDecoded => write!(f, "ImageDecoded"),
            PipelineState::Detected => write!(f, "Detected"),
            PipelineState::Filtered => write!(f, "Filtered"),
            PipelineState::Ranked => write!(f, "Ranked"),
            PipelineState::Cropped(i) => write!(f, "Cropped({})", i),
            PipelineState::PreProcessed(i) => write!(f, "PreProcessed({})", i),
            PipelineState::Recognized(i) => write!(f, "Recognized({})", i),
            PipelineState::Assembled => write!(f, "Assembled"),
            PipelineState::Done => write!(f, "Done"),
            PipelineState::Error => write!(f, "Error"),
        }
    }
}

impl PipelineState {
    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Error {
            return !matches!(self, Done | Error);
        }

        match (*self, next) {
            (Idle, ImageDecoded) => true,
            (ImageDecoded, Detected) => true,
            (Detected, Filtered) => true,
            (Filtered, Ranked) => true,
            // Detection-only runs, or no usable regions
            (Ranked, Assembled) => true,
            // Degenerate regions are skipped, so indices may jump
            (Ranked, Cropped(_)) => true,
            (Cropped(i), PreProcessed(j)) => i == j,
            (PreProcessed(i), Recognized(j)) => i == j,
            (Recognized(i), Cropped(j)) => j > i,
            (Recognized(_), Assembled) => true,
            (Assembled, Done) => true,
            _ => false,
        }
    }
}

/// Records and traces the states one request passes through
#[derive(Debug)]
pub struct StateTrace {
    request_id: Uuid,
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl StateTrace {
    pub fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    pub fn advance(&mut self, next: PipelineState) {
        if !self.current.can_transition_to(next) {
            warn!(
                "[{}] unexpected transition {} -> {}",
                self.request_id, self.current, next
            );
        }
        debug!("[{}] {} -> {}", self.request_id, self.current, next);
        self.current = next;
        self.history.push(next);
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}
