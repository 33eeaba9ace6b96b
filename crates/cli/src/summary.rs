//! Extraction summary printed by `run`.

use std::path::PathBuf;

use contracts::{ExtractionReport, ExtractionResult, RealWorldImage, Timestamp};
use observability::MetricsSummary;
use serde::Serialize;

/// Per-frame digest of a kept frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    /// Effective ms, or raw stream us when no targets are set
    pub timestamp: Timestamp,
    pub width: u32,
    pub height: u32,
    /// Pixels with a depth reading
    pub valid_depth_pixels: usize,
    /// Mean depth of valid pixels (sensor units)
    pub mean_depth: f64,
}

impl FrameSummary {
    fn new(timestamp: Timestamp, real_world: &RealWorldImage) -> Self {
        let (count, sum) = real_world
            .pixels()
            .map(|p| p.0[2])
            .filter(|z| *z > 0.0)
            .fold((0usize, 0.0f64), |(n, s), z| (n + 1, s + z as f64));

        Self {
            timestamp,
            width: real_world.width(),
            height: real_world.height(),
            valid_depth_pixels: count,
            mean_depth: if count > 0 { sum / count as f64 } else { 0.0 },
        }
    }
}

/// Result of a `run` invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub recording: PathBuf,
    pub frame_count: usize,
    pub targets: Vec<Timestamp>,
    pub tolerance_ms: Timestamp,
    pub absolute: bool,
    pub runs: Vec<ExtractionReport>,
    pub frames: Vec<FrameSummary>,
    #[serde(skip)]
    pub metrics: Option<MetricsSummary>,
}

impl RunSummary {
    pub fn frames_from(result: &ExtractionResult) -> Vec<FrameSummary> {
        result
            .timestamps
            .iter()
            .zip(&result.real_world)
            .map(|(ts, rw)| FrameSummary::new(*ts, rw))
            .collect()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Extraction Summary ===\n");
        println!("Recording: {}", self.recording.display());
        println!("  Frames in recording: {}", self.frame_count);
        if self.targets.is_empty() {
            println!("  Targets: (all frames)");
        } else {
            println!(
                "  Targets: {:?} +/- {} ms ({})",
                self.targets,
                self.tolerance_ms,
                if self.absolute { "absolute" } else { "relative" }
            );
        }

        for (i, run) in self.runs.iter().enumerate() {
            println!(
                "\nRun {}: scanned {}, kept {}, stored {}, {:?} in {:.2?}",
                i + 1,
                run.frames_scanned,
                run.frames_kept,
                run.frames_stored,
                run.outcome,
                run.elapsed
            );
            for warning in &run.diagnostics {
                println!("  warning: {warning}");
            }
        }

        if !self.frames.is_empty() {
            println!("\nKept frames ({}):", self.frames.len());
            for frame in &self.frames {
                println!(
                    "  {:>16}  {}x{}  valid depth {:>7}  mean depth {:.1}",
                    frame.timestamp,
                    frame.width,
                    frame.height,
                    frame.valid_depth_pixels,
                    frame.mean_depth
                );
            }
        }

        if let Some(metrics) = &self.metrics {
            println!("\n{metrics}");
        }
    }
}
