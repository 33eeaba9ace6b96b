//! Main extraction engine implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use contracts::{
    ColorImage, DepthImage, ExtractError, ExtractionOptions, ExtractionReport, ExtractionResult,
    ExtractorConfig, FrameSource, RealWorldImage, RealWorldProjector, ScanOutcome, Timestamp,
    TimestampBasis, TimestampValue,
};
use frame_matcher::{TimestampMatcher, Verdict};
use tracing::{debug, info, instrument, trace, warn};

use crate::convert::{convert_color, convert_real_world, depth_from_real_world};
use crate::store::{FrameStore, StoreMode};

/// Cooperative cancellation flag for a running extraction
///
/// Checked before every `advance()`. A cancellation is consumed by the run
/// that observes it.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request the current (or next) run to stop
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// Resources acquired by a successful `init()`
struct Session {
    projector: Arc<dyn RealWorldProjector>,
}

/// RGB-D frame extraction engine
///
/// Drives a single linear pass over a `FrameSource`, asking the
/// `TimestampMatcher` about every frame and converting only accepted ones.
///
/// `extract()` takes `&mut self`, so a second run cannot start while one is
/// in flight.
pub struct ExtractionEngine {
    /// Per-run switches
    options: ExtractionOptions,
    /// Target matching state
    matcher: TimestampMatcher,
    /// Accumulated output
    store: FrameStore,
    /// Recording decoder
    source: Option<Box<dyn FrameSource>>,
    /// Projector overriding the one supplied by the source
    projector: Option<Arc<dyn RealWorldProjector>>,
    /// Present between `init()` and `release()`
    session: Option<Session>,
    /// Frame count reported by the last `init()`
    frame_count: usize,
    cancel: CancelHandle,
}

impl std::fmt::Debug for ExtractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionEngine")
            .field("options", &self.options)
            .field("matcher", &self.matcher)
            .field("stored", &self.store.len())
            .field("initialized", &self.session.is_some())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::new(ExtractionOptions::default())
    }
}

impl ExtractionEngine {
    /// Create an engine without a source
    pub fn new(options: ExtractionOptions) -> Self {
        let mut matcher = TimestampMatcher::new();
        matcher.set_early_stop(options.early_stop);
        Self {
            options,
            matcher,
            store: FrameStore::new(),
            source: None,
            projector: None,
            session: None,
            frame_count: 0,
            cancel: CancelHandle::default(),
        }
    }

    /// Create an engine with targets, basis and options from a configuration
    ///
    /// The recording itself is attached separately with `set_source`.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let mut engine = Self::new(config.options);
        engine.set_target_values(&config.targets, config.tolerance_ms)?;
        engine.set_basis(config.basis);
        if let Some(reference) = config.reference_time_ms {
            engine.set_reference_time(reference);
        }
        Ok(engine)
    }

    /// Attach the recording to extract from
    ///
    /// Releases the previous source if it was initialized.
    pub fn set_source(&mut self, source: Box<dyn FrameSource>) {
        self.release();
        self.source = Some(source);
    }

    /// Use `projector` instead of the one supplied by the source
    pub fn set_projector(&mut self, projector: Arc<dyn RealWorldProjector>) {
        self.projector = Some(projector);
    }

    /// Replace target timestamps and tolerance
    pub fn set_targets(
        &mut self,
        targets: impl IntoIterator<Item = Timestamp>,
        tolerance: Timestamp,
    ) {
        self.matcher.set_targets(targets, tolerance);
    }

    /// Replace targets from textual timestamps
    pub fn set_target_strs<S: AsRef<str>>(
        &mut self,
        targets: &[S],
        tolerance: Timestamp,
    ) -> Result<(), ExtractError> {
        let values: Vec<TimestampValue> = targets
            .iter()
            .map(|s| TimestampValue::Text(s.as_ref().to_string()))
            .collect();
        self.set_target_values(&values, tolerance)
    }

    /// Replace targets from numeric or textual timestamps
    pub fn set_target_values(
        &mut self,
        targets: &[TimestampValue],
        tolerance: Timestamp,
    ) -> Result<(), ExtractError> {
        self.matcher.set_target_values(targets, tolerance)
    }

    /// Current targets, ascending
    pub fn targets(&self) -> &[Timestamp] {
        self.matcher.targets().as_slice()
    }

    pub fn tolerance(&self) -> Timestamp {
        self.matcher.targets().tolerance()
    }

    /// Set the absolute start time of the recording, switching to absolute matching
    pub fn set_reference_time(&mut self, reference: Timestamp) {
        self.matcher.set_reference_time(reference);
        if self.options.verbose {
            info!(reference, "reference time set, expecting absolute timestamps");
        }
    }

    /// Adopt the start time stored in the recording as reference time
    pub fn use_recording_start(&mut self) -> Result<Timestamp, ExtractError> {
        let start = self
            .source
            .as_ref()
            .and_then(|source| source.recording_start())
            .ok_or_else(|| {
                ExtractError::configuration("recording does not report a start time")
            })?;
        self.set_reference_time(start);
        Ok(start)
    }

    pub fn set_basis(&mut self, basis: TimestampBasis) {
        self.matcher.set_basis(basis);
    }

    pub fn set_append(&mut self, append: bool) {
        self.options.append = append;
    }

    pub fn set_swap_red_blue(&mut self, swap: bool) {
        self.options.swap_red_blue = swap;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.options.verbose = verbose;
    }

    pub fn set_early_stop(&mut self, early_stop: bool) {
        self.options.early_stop = early_stop;
        self.matcher.set_early_stop(early_stop);
    }

    pub fn options(&self) -> ExtractionOptions {
        self.options
    }

    pub fn matcher(&self) -> &TimestampMatcher {
        &self.matcher
    }

    /// Handle for cancelling a run from elsewhere
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Open the source and resolve the projector
    ///
    /// Returns the frame count. Calling it again re-opens the source.
    #[instrument(name = "extraction_engine_init", skip(self))]
    pub fn init(&mut self) -> Result<usize, ExtractError> {
        self.release();

        let source = self
            .source
            .as_mut()
            .ok_or_else(|| ExtractError::configuration("no frame source specified"))?;

        let frame_count = source.open().map_err(ExtractError::SourceUnavailable)?;
        if frame_count == 0 {
            source.release();
            return Err(ExtractError::configuration("no frames found"));
        }

        let projector = match (&self.projector, source.projector()) {
            (Some(projector), _) => Arc::clone(projector),
            (None, Some(projector)) => Arc::from(projector),
            (None, None) => {
                source.release();
                return Err(ExtractError::configuration(
                    "no real-world projector available",
                ));
            }
        };

        if self.options.verbose {
            info!(frame_count, "frame source opened");
        } else {
            debug!(frame_count, "frame source opened");
        }

        self.frame_count = frame_count;
        self.session = Some(Session { projector });
        Ok(frame_count)
    }

    /// Release the source. Idempotent.
    ///
    /// Returns `true` if resources were held and are now freed.
    pub fn release(&mut self) -> bool {
        if self.session.take().is_none() {
            return false;
        }
        if let Some(source) = self.source.as_mut() {
            source.release();
        }
        debug!("frame source released");
        true
    }

    /// Run one extraction pass
    ///
    /// Succeeds with zero kept frames when nothing matches. A source failure
    /// mid-scan aborts the run; frames kept before it stay in the store.
    #[instrument(name = "extraction_engine_extract", skip(self))]
    pub fn extract(&mut self) -> Result<ExtractionReport, ExtractError> {
        let projector = match &self.session {
            Some(session) => Arc::clone(&session.projector),
            None => {
                warn!("extract() called before init()");
                return Err(ExtractError::Uninitialized);
            }
        };

        let started = Instant::now();
        let options = self.options;
        let frame_count = self.frame_count;

        self.log_run_start();
        self.store.begin_run(StoreMode::from_append(options.append));
        self.matcher.begin_run();

        let source = self.source.as_mut().ok_or(ExtractError::Uninitialized)?;
        source.rewind().map_err(|err| ExtractError::Source {
            position: 0,
            source: err,
        })?;

        let mut report = ExtractionReport::default();

        for position in 0..frame_count {
            if self.cancel.take() {
                info!(position, "extraction cancelled");
                report.outcome = ScanOutcome::Cancelled;
                break;
            }

            let frame = source.advance().map_err(|err| ExtractError::Source {
                position,
                source: err,
            })?;
            report.frames_scanned += 1;

            let stream_ms = frame.timestamp_ms();
            let timestamp = match self.matcher.evaluate(stream_ms) {
                Verdict::Stop => {
                    debug!(position, stream_ms, "no later frame can match, stopping scan");
                    report.outcome = ScanOutcome::StoppedEarly;
                    break;
                }
                Verdict::Skip => {
                    trace!(position, stream_ms, "frame skipped");
                    continue;
                }
                Verdict::Keep { timestamp } => timestamp,
                // Unfiltered runs hand back the recording's own clock
                Verdict::KeepRaw => frame.timestamp_us,
            };

            if options.verbose {
                info!(position, frame_count, timestamp, "found frame");
            } else {
                debug!(position, frame_count, timestamp, "found frame");
            }

            let converting = Instant::now();
            let color = convert_color(&frame.color, options.swap_red_blue)?;
            let real_world = convert_real_world(&frame.depth, projector.as_ref())?;
            metrics::histogram!("extractor_conversion_seconds")
                .record(converting.elapsed().as_secs_f64());

            self.store.push(color, real_world, timestamp);
            report.frames_kept += 1;
        }

        report.frames_stored = self.store.len();
        report.diagnostics = self.matcher.diagnostics().to_vec();
        report.elapsed = started.elapsed();

        self.record_run_metrics(&report);
        Ok(report)
    }

    fn log_run_start(&self) {
        let targets = self.matcher.targets();
        if targets.is_empty() {
            if self.options.verbose {
                info!(frame_count = self.frame_count, "extracting every frame");
            }
            return;
        }
        if self.options.verbose {
            info!(
                targets = ?targets.as_slice(),
                tolerance_ms = targets.tolerance(),
                absolute = self.matcher.is_absolute(),
                "timestamps of interest"
            );
        } else {
            debug!(
                targets = ?targets.as_slice(),
                tolerance_ms = targets.tolerance(),
                absolute = self.matcher.is_absolute(),
                "timestamps of interest"
            );
        }
    }

    fn record_run_metrics(&self, report: &ExtractionReport) {
        let outcome = match report.outcome {
            ScanOutcome::Exhausted => "exhausted",
            ScanOutcome::StoppedEarly => "stopped_early",
            ScanOutcome::Cancelled => "cancelled",
        };
        metrics::counter!("extractor_runs_total", "outcome" => outcome).increment(1);
        metrics::counter!("extractor_frames_scanned_total")
            .increment(report.frames_scanned as u64);
        metrics::counter!("extractor_frames_kept_total").increment(report.frames_kept as u64);
    }

    /// Frame count of the recording (0 before the first `init()`)
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of frames currently stored
    pub fn stored_len(&self) -> usize {
        self.store.len()
    }

    /// Copies of the stored color images
    pub fn color_images(&self) -> Vec<ColorImage> {
        self.store.color().to_vec()
    }

    /// Copies of the stored real-world coordinate images
    pub fn real_world_images(&self) -> Vec<RealWorldImage> {
        self.store.real_world().to_vec()
    }

    /// Depth-only maps derived from the stored real-world images
    pub fn depth_images(&self) -> Vec<DepthImage> {
        self.store
            .real_world()
            .iter()
            .map(depth_from_real_world)
            .collect()
    }

    /// Copies of the stored timestamps
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.store.timestamps().to_vec()
    }

    /// Snapshot of everything stored
    pub fn result(&self) -> ExtractionResult {
        self.store.snapshot()
    }
}

impl Drop for ExtractionEngine {
    fn drop(&mut self) {
        self.release();
    }
}
