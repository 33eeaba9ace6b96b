//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::{parse_timestamp, ExtractorConfig, TimestampValue};
use extractor::ExtractionEngine;
use observability::{record_extraction_report, ExtractionMetricsAggregator};
use recording::ReplaySource;

use crate::cli::RunArgs;
use crate::summary::RunSummary;

/// Execute the `run` command
pub fn run_extract(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;

    for warning in ConfigLoader::warnings(&config) {
        warn!(%warning, "timestamp basis mismatch in configuration");
    }

    let recording = config
        .recording
        .clone()
        .context("No recording given (use --recording or set `recording` in the config)")?;

    let mut engine =
        ExtractionEngine::from_config(&config).context("Invalid extraction settings")?;
    engine.set_source(Box::new(ReplaySource::new(&recording)));

    let frame_count = engine
        .init()
        .with_context(|| format!("Failed to open recording {}", recording.display()))?;

    if config.use_recording_start {
        let start = engine
            .use_recording_start()
            .context("--use-recording-start requires a manifest with start_time_ms")?;
        info!(start_time_ms = start, "Using recording start as reference time");
    }

    info!(
        recording = %recording.display(),
        frames = frame_count,
        targets = engine.targets().len(),
        tolerance_ms = engine.tolerance(),
        "Recording opened"
    );

    let mut aggregator = ExtractionMetricsAggregator::new();
    let mut runs = Vec::with_capacity(args.runs as usize);
    for _ in 0..args.runs.max(1) {
        let report = engine.extract().context("Extraction failed")?;
        record_extraction_report(&report);
        aggregator.update(&report);
        runs.push(report);
    }
    engine.release();

    let summary = RunSummary {
        recording,
        frame_count,
        targets: engine.targets().to_vec(),
        tolerance_ms: engine.tolerance(),
        absolute: engine.matcher().is_absolute(),
        runs,
        frames: RunSummary::frames_from(&engine.result()),
        metrics: (args.runs > 1).then(|| aggregator.summary()),
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        println!("{json}");
    } else {
        summary.print_summary();
    }

    Ok(())
}

/// Load the config file (if any) and apply command line overrides
fn build_config(args: &RunArgs) -> Result<ExtractorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => ExtractorConfig::default(),
    };

    if let Some(recording) = &args.recording {
        config.recording = Some(recording.clone());
    }
    if !args.targets.is_empty() {
        config.targets = args
            .targets
            .iter()
            .map(|t| TimestampValue::Text(t.trim().to_string()))
            .collect();
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance_ms = tolerance;
    }
    if let Some(reference) = &args.reference_time {
        config.reference_time_ms = Some(
            parse_timestamp(reference)
                .with_context(|| format!("Invalid --reference-time '{reference}'"))?,
        );
        config.use_recording_start = false;
    }
    if args.use_recording_start {
        config.use_recording_start = true;
        config.reference_time_ms = None;
    }
    if let Some(basis) = args.basis {
        config.basis = basis.into();
    }

    config.options.append |= args.append;
    config.options.swap_red_blue |= args.swap_red_blue;
    config.options.verbose |= args.frame_log;
    if args.no_early_stop {
        config.options.early_stop = false;
    }

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}
