//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::FrameSource;
use recording::{read_manifest, RecordingManifest, ReplaySource};

use crate::cli::InfoArgs;

/// Recording info for JSON output
#[derive(Serialize)]
struct RecordingInfo {
    path: String,
    #[serde(flatten)]
    manifest: RecordingManifest,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamps_ms: Option<Vec<u64>>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(recording = %args.recording.display(), "Loading recording info");

    if !args.recording.exists() {
        anyhow::bail!("Recording not found: {}", args.recording.display());
    }

    let manifest = read_manifest(&args.recording)
        .with_context(|| format!("Failed to read manifest of {}", args.recording.display()))?;

    let timestamps_ms = if args.timestamps {
        Some(collect_timestamps(args)?)
    } else {
        None
    };

    let info = RecordingInfo {
        path: args.recording.display().to_string(),
        manifest,
        timestamps_ms,
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize recording info")?;
        println!("{}", json);
    } else {
        print_recording_info(&info);
    }

    Ok(())
}

fn collect_timestamps(args: &InfoArgs) -> Result<Vec<u64>> {
    let mut source = ReplaySource::new(&args.recording);
    let count = source.open().context("Failed to open recording")?;

    let mut timestamps = Vec::with_capacity(count);
    for position in 0..count {
        let frame = source
            .advance()
            .with_context(|| format!("Failed to read frame {position}"))?;
        timestamps.push(frame.timestamp_ms());
    }
    source.release();
    Ok(timestamps)
}

fn print_recording_info(info: &RecordingInfo) {
    let manifest = &info.manifest;

    println!("Recording: {}", info.path);
    println!("   ├─ Version: {}", manifest.version);
    println!("   ├─ Created: {}", manifest.created_at);
    match manifest.start_time_ms {
        Some(start) => println!("   ├─ Start time: {} ms", start),
        None => println!("   ├─ Start time: (not recorded)"),
    }
    println!("   ├─ Frames: {}", manifest.frame_count);
    println!(
        "   ├─ Color: {}x{}",
        manifest.color.width, manifest.color.height
    );
    println!(
        "   └─ Depth: {}x{} (fov {:.3} x {:.3} rad)",
        manifest.depth.width,
        manifest.depth.height,
        manifest.depth.horizontal_fov,
        manifest.depth.vertical_fov
    );

    if let Some(ref timestamps) = info.timestamps_ms {
        println!("\nTimestamps (ms):");
        for (i, ts) in timestamps.iter().enumerate() {
            println!("   {:>6}  {}", i, ts);
        }
    }

    println!();
}
