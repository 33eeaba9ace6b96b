//! ExtractorConfig - Config Loader output
//!
//! Describes one extraction session: recording, targets, basis and store options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ExtractError, Timestamp, TimestampBasis, TimestampValue};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Recording directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<PathBuf>,

    /// Target timestamps (empty = extract every frame)
    #[serde(default)]
    pub targets: Vec<TimestampValue>,

    /// Match tolerance in milliseconds (exclusive)
    #[serde(default)]
    pub tolerance_ms: Timestamp,

    /// Absolute start time of the recording
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_time_ms: Option<Timestamp>,

    /// Take the reference time from the recording itself
    #[serde(default)]
    pub use_recording_start: bool,

    /// Basis the targets are given in
    #[serde(default)]
    pub basis: TimestampBasis,

    #[serde(flatten)]
    pub options: ExtractionOptions,
}

impl ExtractorConfig {
    /// Resolve numeric and textual targets to milliseconds
    pub fn resolved_targets(&self) -> Result<Vec<Timestamp>, ExtractError> {
        self.targets.iter().map(TimestampValue::resolve).collect()
    }
}

/// Per-run behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Keep previously extracted frames across runs
    #[serde(default)]
    pub append: bool,

    /// Swap first and third color channel
    #[serde(default)]
    pub swap_red_blue: bool,

    /// Per-frame progress trace at info level
    #[serde(default)]
    pub verbose: bool,

    /// Stop scanning once no later frame can match
    #[serde(default = "default_early_stop")]
    pub early_stop: bool,
}

fn default_early_stop() -> bool {
    true
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            append: false,
            swap_red_blue: false,
            verbose: false,
            early_stop: true,
        }
    }
}
