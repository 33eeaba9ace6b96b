//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 磁盘录制 -> ReplaySource -> ExtractionEngine
//! - 配置文件 -> ExtractionEngine
//! - 完整提取的行为性质

#[cfg(test)]
mod contract_tests {
    use contracts::{parse_timestamp, ConfigVersion, TimestampValue, ABSOLUTE_THRESHOLD_MS};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
        assert_eq!(ABSOLUTE_THRESHOLD_MS, 946_684_800_000);
    }

    #[test]
    fn test_textual_timestamps() {
        assert_eq!(parse_timestamp("  1500 ").unwrap(), 1500);
        assert_eq!(parse_timestamp("0x5DC").unwrap(), 1500);
        assert_eq!(parse_timestamp("02734").unwrap(), 1500);
        assert!(TimestampValue::from("15s").resolve().is_err());
    }
}

/// Shared fixtures
#[cfg(test)]
mod fixtures {
    use std::path::Path;

    use contracts::Timestamp;
    use recording::{
        ColorStreamInfo, DepthStreamInfo, RecordingWriter, SyntheticSource, DEFAULT_HORIZONTAL_FOV,
        DEFAULT_VERTICAL_FOV,
    };

    pub const WIDTH: u32 = 8;
    pub const HEIGHT: u32 = 6;
    pub const START: Timestamp = 1_600_000_000_000;

    /// Write a recording whose frame `i` matches `SyntheticSource` frame `i`
    pub fn write_recording(root: &Path, timestamps_ms: &[Timestamp], start: Option<Timestamp>) {
        let color = ColorStreamInfo {
            width: WIDTH,
            height: HEIGHT,
        };
        let depth = DepthStreamInfo {
            width: WIDTH,
            height: HEIGHT,
            horizontal_fov: DEFAULT_HORIZONTAL_FOV,
            vertical_fov: DEFAULT_VERTICAL_FOV,
        };
        let mut writer = RecordingWriter::create(root, color, depth, start).unwrap();

        let pixels = (WIDTH * HEIGHT) as usize;
        for (i, ts) in timestamps_ms.iter().enumerate() {
            let color: Vec<u8> = (0..pixels)
                .flat_map(|p| SyntheticSource::color_value(i, p))
                .collect();
            let depth: Vec<u16> = (0..pixels)
                .map(|p| SyntheticSource::depth_value(i, p))
                .collect();
            writer.write_frame(ts * 1000, &color, &depth).unwrap();
        }
        writer.finish().unwrap();
    }

    /// 0, 1000, ..., 10000 ms
    pub fn thousands() -> Vec<Timestamp> {
        (0..=10).map(|i| i * 1000).collect()
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{ExtractionResult, Timestamp};
    use extractor::{ExtractionEngine, ScanOutcome};
    use frame_matcher::TimestampMatcher;
    use rand::Rng;
    use recording::{SyntheticConfig, SyntheticSource};

    fn extract(
        timestamps_ms: &[Timestamp],
        configure: impl FnOnce(&mut ExtractionEngine),
    ) -> ExtractionResult {
        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::from_millis(
            timestamps_ms.iter().copied(),
        )));
        configure(&mut engine);
        engine.init().unwrap();
        engine.extract().unwrap();
        engine.result()
    }

    #[test]
    fn sorted_invariant_and_replacement() {
        let mut rng = rand::rng();
        let mut matcher = TimestampMatcher::new();

        for _ in 0..50 {
            let len = rng.random_range(0..20);
            let targets: Vec<Timestamp> = (0..len).map(|_| rng.random_range(0..100_000)).collect();
            matcher.set_targets(targets.iter().copied(), 10);

            let stored = matcher.targets().as_slice();
            assert!(stored.windows(2).all(|w| w[0] <= w[1]));

            let mut expected = targets.clone();
            expected.sort_unstable();
            assert_eq!(stored, expected.as_slice());
        }
    }

    #[test]
    fn full_recording_idempotence() {
        // 非整毫秒的微秒时间戳
        let stamps: Vec<u64> = (0..7).map(|i| 100_250 + i * 33_367).collect();
        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::new(
            stamps.clone(),
            SyntheticConfig::default(),
        )));
        engine.init().unwrap();

        engine.extract().unwrap();
        let first = engine.result();
        engine.extract().unwrap();
        assert_eq!(first, engine.result());
        assert_eq!(first.len(), 7);
        assert_eq!(first.timestamps, stamps);
    }

    #[test]
    fn tolerance_boundary() {
        let frames = [900, 901, 1099, 1100];
        let result = extract(&frames, |engine| {
            engine.set_targets([1000], 100);
            engine.set_early_stop(false);
        });
        assert_eq!(result.timestamps, vec![901, 1099]);
    }

    #[test]
    fn stop_scan_correctness() {
        let frames = super::fixtures::thousands();
        let configure = |early_stop: bool| {
            move |engine: &mut ExtractionEngine| {
                engine.set_targets([1000, 2000], 50);
                engine.set_early_stop(early_stop);
            }
        };

        let stopped = extract(&frames, configure(true));
        let full = extract(&frames, configure(false));
        assert_eq!(stopped.timestamps, vec![1000, 2000]);
        assert_eq!(stopped, full);
    }

    #[test]
    fn stop_scan_never_cuts_a_tolerance_window() {
        // 2030 is past the last target but still inside its window
        let frames = [1000, 2000, 2030, 2049, 2050, 3000];
        let stopped = extract(&frames, |engine| engine.set_targets([2000], 50));
        let full = extract(&frames, |engine| {
            engine.set_targets([2000], 50);
            engine.set_early_stop(false);
        });
        assert_eq!(stopped.timestamps, vec![2000, 2030, 2049]);
        assert_eq!(stopped, full);
    }

    #[test]
    fn absolute_relative_round_trip() {
        let reference: Timestamp = 1_500_000_000_000;
        let result = extract(&[0, 2500, 5000, 7500], |engine| {
            engine.set_reference_time(reference);
            engine.set_targets([reference + 5000], 1);
        });
        assert_eq!(result.timestamps, vec![reference + 5000]);
    }

    #[test]
    fn multi_match_behavior() {
        let result = extract(&[995, 1005], |engine| engine.set_targets([1000], 50));
        assert_eq!(result.timestamps, vec![995, 1005]);
    }

    #[test]
    fn overlapping_windows_keep_frame_once() {
        let result = extract(&[1000, 1010, 1020], |engine| {
            engine.set_targets([1000, 1020], 50)
        });
        assert_eq!(result.timestamps, vec![1000, 1010, 1020]);
    }

    #[test]
    fn append_mode() {
        let frames = super::fixtures::thousands();
        let single = extract(&frames, |engine| engine.set_targets([3000, 7000], 10));

        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::from_millis(frames.iter().copied())));
        engine.set_targets([3000, 7000], 10);
        engine.set_append(true);
        engine.init().unwrap();
        engine.extract().unwrap();
        engine.extract().unwrap();

        let doubled = engine.result();
        assert_eq!(doubled.len(), 2 * single.len());
        let half = single.len();
        assert_eq!(&doubled.timestamps[half..], &single.timestamps[..]);
        assert_eq!(&doubled.color[half..], &single.color[..]);
        assert_eq!(&doubled.real_world[half..], &single.real_world[..]);
    }

    #[test]
    fn zero_frame_success() {
        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::evenly_spaced(0, 1000, 11)));
        engine.set_targets([500, 20_000], 100);
        engine.init().unwrap();

        let report = engine.extract().unwrap();
        assert_eq!(report.frames_kept, 0);
        assert_eq!(report.outcome, ScanOutcome::Exhausted);
        assert!(engine.result().is_empty());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BasisWarning, FrameSource, RealWorldProjector};
    use extractor::{ExtractionEngine, ScanOutcome};
    use observability::ExtractionMetricsAggregator;
    use recording::{FovProjector, ReplaySource, SyntheticSource};
    use tempfile::tempdir;

    use super::fixtures::{thousands, write_recording, HEIGHT, START, WIDTH};

    /// 验证完整的数据流：
    /// 1. RecordingWriter 写出磁盘录制
    /// 2. ReplaySource 逐帧回放
    /// 3. ExtractionEngine 按目标时间戳提取并转换
    #[test]
    fn test_e2e_replay_extraction() {
        let dir = tempdir().unwrap();
        write_recording(dir.path(), &thousands(), None);

        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(ReplaySource::new(dir.path())));
        engine.set_targets([2000, 6000], 20);
        engine.set_swap_red_blue(true);
        assert_eq!(engine.init().unwrap(), 11);

        let report = engine.extract().unwrap();
        assert_eq!(report.outcome, ScanOutcome::StoppedEarly);
        assert_eq!(report.frames_scanned, 8);
        assert_eq!(engine.timestamps(), vec![2000, 6000]);

        // Color: frame 2, pixel 0 with red and blue swapped
        let [r, g, b] = SyntheticSource::color_value(2, 0);
        let color = engine.color_images();
        assert_eq!(color[0].dimensions(), (WIDTH, HEIGHT));
        assert_eq!(color[0].get_pixel(0, 0).0, [b, g, r]);

        // Depth survives the real-world round trip
        let depth = engine.depth_images();
        let pixel = (3 + 2 * WIDTH) as usize;
        assert_eq!(
            depth[1].get_pixel(3, 2).0[0],
            SyntheticSource::depth_value(6, pixel)
        );

        // Real world image uses the recording's field of view
        let projector = FovProjector::with_default_fov(WIDTH, HEIGHT);
        let z = SyntheticSource::depth_value(2, 0) as f32;
        let expected = projector.project(&[contracts::Point3::new(0.0, 0.0, z)])[0];
        let real_world = engine.real_world_images();
        let got = real_world[0].get_pixel(0, 0).0;
        assert!((got[0] - expected.x).abs() < 1e-3);
        assert!((got[1] - expected.y).abs() < 1e-3);
        assert_eq!(got[2], z);

        assert!(engine.release());
    }

    /// Replay and synthetic sources produce the same extraction
    #[test]
    fn test_replay_matches_synthetic() {
        let dir = tempdir().unwrap();
        write_recording(dir.path(), &thousands(), None);

        let run = |source: Box<dyn FrameSource>| {
            let mut engine = ExtractionEngine::default();
            engine.set_source(source);
            engine.set_targets([1000, 4000, 9000], 100);
            engine.init().unwrap();
            engine.extract().unwrap();
            engine.result()
        };

        let replayed = run(Box::new(ReplaySource::new(dir.path())));
        let synthetic = run(Box::new(
            SyntheticSource::from_millis(thousands()).with_resolution(WIDTH, HEIGHT),
        ));
        assert_eq!(replayed, synthetic);
    }

    /// Config file -> engine with absolute targets resolved against the manifest
    #[test]
    fn test_config_to_engine_with_recording_start() {
        let dir = tempdir().unwrap();
        write_recording(dir.path(), &thousands(), Some(START));

        let toml = format!(
            "recording = {:?}\ntargets = [\"{}\", {}]\ntolerance_ms = 5\nuse_recording_start = true\n",
            dir.path().display().to_string(),
            START + 3000,
            START + 8000,
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert!(ConfigLoader::warnings(&config).is_empty());

        let mut engine = ExtractionEngine::from_config(&config).unwrap();
        let recording = config.recording.clone().unwrap();
        engine.set_source(Box::new(ReplaySource::new(recording)));
        engine.init().unwrap();
        assert_eq!(engine.use_recording_start().unwrap(), START);

        let report = engine.extract().unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(engine.timestamps(), vec![START + 3000, START + 8000]);
    }

    /// Absolute targets without a reference are matched as-is and reported
    #[test]
    fn test_basis_mismatch_reported() {
        let dir = tempdir().unwrap();
        write_recording(dir.path(), &thousands(), None);

        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(ReplaySource::new(dir.path())));
        engine.set_targets([START + 1000], 5);
        engine.init().unwrap();

        let report = engine.extract().unwrap();
        assert_eq!(report.diagnostics, vec![BasisWarning::MissingReference]);
        assert_eq!(report.frames_kept, 0);
        assert_eq!(report.frames_scanned, 11);
    }

    /// An explicit projector replaces the recording's own
    #[test]
    fn test_projector_override() {
        struct Flat;
        impl RealWorldProjector for Flat {
            fn project(&self, projective: &[contracts::Point3]) -> Vec<contracts::Point3> {
                projective
                    .iter()
                    .map(|p| contracts::Point3::new(0.0, 0.0, p.z))
                    .collect()
            }
        }

        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::from_millis([0])));
        engine.set_projector(Arc::new(Flat));
        engine.init().unwrap();
        engine.extract().unwrap();

        let rw = &engine.real_world_images()[0];
        assert!(rw.pixels().all(|p| p.0[0] == 0.0 && p.0[1] == 0.0));
    }

    /// Missing recording surfaces as SourceUnavailable
    #[test]
    fn test_missing_recording() {
        let dir = tempdir().unwrap();
        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(ReplaySource::new(dir.path().join("absent"))));
        let err = engine.init().unwrap_err();
        assert!(matches!(err, extractor::ExtractError::SourceUnavailable(_)));
    }

    /// Reports aggregate across repeated runs
    #[test]
    fn test_metrics_aggregation_across_runs() {
        let mut engine = ExtractionEngine::default();
        engine.set_source(Box::new(SyntheticSource::from_millis(thousands())));
        engine.set_targets([5000], 10);
        engine.set_append(true);
        engine.init().unwrap();

        let mut aggregator = ExtractionMetricsAggregator::new();
        for _ in 0..3 {
            let report = engine.extract().unwrap();
            observability::record_extraction_report(&report);
            aggregator.update(&report);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_runs, 3);
        assert_eq!(summary.total_kept, 3);
        assert_eq!(engine.stored_len(), 3);
        assert_eq!(summary.outcomes.get("stopped_early"), Some(&3));
    }
}
