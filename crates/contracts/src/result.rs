//! ExtractionResult / ExtractionReport - Extraction Engine output

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BasisWarning, ColorImage, RealWorldImage, Timestamp};

/// Accepted frames as three parallel sequences.
///
/// Index `i` of every sequence refers to the same frame, in scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub color: Vec<ColorImage>,
    pub real_world: Vec<RealWorldImage>,
    /// Effective ms when filtering by target, raw stream us otherwise
    pub timestamps: Vec<Timestamp>,
}

impl ExtractionResult {
    /// Number of accepted frames
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Why a scan ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Every position was visited
    #[default]
    Exhausted,
    /// No later frame could match any target
    StoppedEarly,
    /// Caller requested cancellation
    Cancelled,
}

/// Summary of a single `extract()` run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Positions advanced over
    pub frames_scanned: usize,
    /// Frames accepted during this run
    pub frames_kept: usize,
    /// Frames held by the store after this run (includes appended runs)
    pub frames_stored: usize,
    pub outcome: ScanOutcome,
    /// Basis diagnostics raised at the first candidate frame
    pub diagnostics: Vec<BasisWarning>,
    pub elapsed: Duration,
}
