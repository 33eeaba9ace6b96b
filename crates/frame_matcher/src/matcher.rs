//! Keep / skip / stop decisions over an ascending timestamp stream.

use contracts::{
    is_absolute_timestamp, BasisWarning, ExtractError, Timestamp, TimestampBasis, TimestampValue,
    ABSOLUTE_THRESHOLD_MS,
};
use tracing::{instrument, warn};

use crate::TargetSet;

/// Decision for one stream timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Store the frame under `timestamp`
    Keep { timestamp: Timestamp },
    /// No targets: store the frame under its raw stream timestamp
    KeepRaw,
    /// Ignore the frame
    Skip,
    /// No later frame can match, end the scan
    Stop,
}

/// Timestamp matcher
///
/// Holds the target set, reference time and basis. Consulted once per
/// frame in stream order; `begin_run` must be called before each scan.
#[derive(Debug, Clone)]
pub struct TimestampMatcher {
    /// Sorted targets + tolerance
    targets: TargetSet,
    /// Absolute start time of the recording
    reference: Option<Timestamp>,
    /// Declared basis of the targets
    basis: TimestampBasis,
    /// Emit `Verdict::Stop` once targets are out of reach
    early_stop: bool,
    /// Basis check still pending for the current run
    check_pending: bool,
    /// Diagnostics raised during the current run
    run_diagnostics: Vec<BasisWarning>,
}

impl Default for TimestampMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampMatcher {
    /// Create a matcher with no targets (every frame is kept)
    pub fn new() -> Self {
        Self {
            targets: TargetSet::default(),
            reference: None,
            basis: TimestampBasis::Auto,
            early_stop: true,
            check_pending: true,
            run_diagnostics: Vec::new(),
        }
    }

    /// Replace the targets and tolerance
    pub fn set_targets(
        &mut self,
        targets: impl IntoIterator<Item = Timestamp>,
        tolerance: Timestamp,
    ) {
        self.targets = TargetSet::new(targets, tolerance);
    }

    /// Replace the targets from numeric or textual values.
    ///
    /// On a parse error the previous targets are left untouched.
    pub fn set_target_values(
        &mut self,
        values: &[TimestampValue],
        tolerance: Timestamp,
    ) -> Result<(), ExtractError> {
        self.targets = TargetSet::from_values(values, tolerance)?;
        Ok(())
    }

    /// Remove all targets, switching to full-recording extraction
    pub fn clear_targets(&mut self) {
        self.targets = TargetSet::default();
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Set the absolute start time of the recording
    pub fn set_reference_time(&mut self, reference: Timestamp) {
        if let Some(previous) = self.reference {
            warn!(previous, reference, "reference time already set, replacing it");
        }
        self.reference = Some(reference);
    }

    pub fn reference_time(&self) -> Option<Timestamp> {
        self.reference
    }

    pub fn set_basis(&mut self, basis: TimestampBasis) {
        self.basis = basis;
    }

    pub fn basis(&self) -> TimestampBasis {
        self.basis
    }

    pub fn set_early_stop(&mut self, early_stop: bool) {
        self.early_stop = early_stop;
    }

    /// Whether targets are compared in absolute (epoch) basis
    pub fn is_absolute(&self) -> bool {
        match self.basis {
            TimestampBasis::Absolute => true,
            TimestampBasis::Relative => false,
            TimestampBasis::Auto => {
                self.reference.is_some() || self.targets.first().is_some_and(is_absolute_timestamp)
            }
        }
    }

    /// Stream timestamp adjusted into the basis of the targets
    pub fn effective_timestamp(&self, stream_ms: Timestamp) -> Timestamp {
        if self.is_absolute() {
            stream_ms.saturating_add(self.reference.unwrap_or(0))
        } else {
            stream_ms
        }
    }

    /// Basis mismatches detectable from the current settings
    pub fn basis_warnings(&self) -> Vec<BasisWarning> {
        let mut warnings = Vec::new();
        if self.targets.is_empty() || !self.is_absolute() {
            return warnings;
        }
        if self.reference.unwrap_or(0) == 0 {
            warnings.push(BasisWarning::MissingReference);
        }
        if let Some(smallest) = self.targets.first() {
            if smallest < ABSOLUTE_THRESHOLD_MS {
                warnings.push(BasisWarning::RelativeLookingTargets { smallest });
            }
        }
        warnings
    }

    /// Re-arm the one-shot basis check and clear run diagnostics
    pub fn begin_run(&mut self) {
        self.check_pending = true;
        self.run_diagnostics.clear();
    }

    /// Diagnostics raised since the last `begin_run`
    pub fn diagnostics(&self) -> &[BasisWarning] {
        &self.run_diagnostics
    }

    /// Decide what to do with the frame at `stream_ms`
    #[instrument(level = "trace", name = "matcher_evaluate", skip(self))]
    pub fn evaluate(&mut self, stream_ms: Timestamp) -> Verdict {
        if self.targets.is_empty() {
            return Verdict::KeepRaw;
        }

        if self.check_pending {
            self.check_pending = false;
            self.raise_basis_warnings();
        }

        let effective = self.effective_timestamp(stream_ms);

        if self.early_stop && self.targets.beyond_reach(effective) {
            return Verdict::Stop;
        }

        match self.targets.first_match(effective) {
            Some(_) => Verdict::Keep {
                timestamp: effective,
            },
            None => Verdict::Skip,
        }
    }

    fn raise_basis_warnings(&mut self) {
        for warning in self.basis_warnings() {
            warn!(%warning, "timestamp basis mismatch");
            metrics::counter!("extractor_basis_warnings_total").increment(1);
            self.run_diagnostics.push(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: Timestamp = 1_600_000_000_000;

    fn matcher(targets: &[Timestamp], tolerance: Timestamp) -> TimestampMatcher {
        let mut m = TimestampMatcher::new();
        m.set_targets(targets.iter().copied(), tolerance);
        m.begin_run();
        m
    }

    #[test]
    fn test_empty_targets_keep_everything() {
        let mut m = matcher(&[], 0);
        for ts in [0, 5, 1_000_000] {
            assert_eq!(m.evaluate(ts), Verdict::KeepRaw);
        }
        assert!(m.diagnostics().is_empty());
    }

    #[test]
    fn test_set_targets_replaces() {
        let mut m = TimestampMatcher::new();
        m.set_targets([5000, 3000], 10);
        m.set_targets([2000, 1000], 20);
        assert_eq!(m.targets().as_slice(), &[1000, 2000]);
        assert_eq!(m.targets().tolerance(), 20);
    }

    #[test]
    fn test_bad_values_leave_targets() {
        let mut m = TimestampMatcher::new();
        m.set_targets([1000], 10);
        let values = vec![TimestampValue::Text("later".into())];
        assert!(m.set_target_values(&values, 5).is_err());
        assert_eq!(m.targets().as_slice(), &[1000]);
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut m = matcher(&[1000], 100);
        m.set_early_stop(false);
        assert_eq!(m.evaluate(900), Verdict::Skip);
        assert_eq!(m.evaluate(901), Verdict::Keep { timestamp: 901 });
        assert_eq!(m.evaluate(1099), Verdict::Keep { timestamp: 1099 });
        assert_eq!(m.evaluate(1100), Verdict::Skip);
    }

    #[test]
    fn test_multi_match_keeps_both() {
        let mut m = matcher(&[1000], 50);
        assert_eq!(m.evaluate(995), Verdict::Keep { timestamp: 995 });
        assert_eq!(m.evaluate(1005), Verdict::Keep { timestamp: 1005 });
    }

    #[test]
    fn test_stop_after_last_window() {
        let mut m = matcher(&[1000, 2000], 50);
        assert_eq!(m.evaluate(0), Verdict::Skip);
        assert_eq!(m.evaluate(1000), Verdict::Keep { timestamp: 1000 });
        assert_eq!(m.evaluate(2000), Verdict::Keep { timestamp: 2000 });
        assert_eq!(m.evaluate(2040), Verdict::Keep { timestamp: 2040 });
        assert_eq!(m.evaluate(3000), Verdict::Stop);
    }

    #[test]
    fn test_stop_disabled() {
        let mut m = matcher(&[1000], 50);
        m.set_early_stop(false);
        assert_eq!(m.evaluate(5000), Verdict::Skip);
    }

    #[test]
    fn test_absolute_targets_with_reference() {
        let mut m = TimestampMatcher::new();
        m.set_reference_time(REFERENCE);
        m.set_targets([REFERENCE + 5000], 10);
        m.begin_run();

        assert!(m.is_absolute());
        assert_eq!(m.effective_timestamp(5000), REFERENCE + 5000);
        assert_eq!(
            m.evaluate(5000),
            Verdict::Keep {
                timestamp: REFERENCE + 5000
            }
        );
        assert!(m.diagnostics().is_empty());
    }

    #[test]
    fn test_auto_basis_from_targets() {
        let m = matcher(&[REFERENCE], 10);
        assert!(m.is_absolute());

        let m = matcher(&[ABSOLUTE_THRESHOLD_MS], 10);
        assert!(!m.is_absolute());
    }

    #[test]
    fn test_explicit_basis_overrides_heuristic() {
        let mut m = matcher(&[REFERENCE], 10);
        m.set_basis(TimestampBasis::Relative);
        assert!(!m.is_absolute());
        assert_eq!(m.effective_timestamp(42), 42);

        let mut m = matcher(&[1000], 10);
        m.set_basis(TimestampBasis::Absolute);
        assert!(m.is_absolute());
    }

    #[test]
    fn test_missing_reference_warning_once() {
        let mut m = matcher(&[REFERENCE + 1000], 10);
        m.evaluate(0);
        m.evaluate(1);
        assert_eq!(m.diagnostics(), &[BasisWarning::MissingReference]);
    }

    #[test]
    fn test_relative_looking_targets_warning() {
        let mut m = TimestampMatcher::new();
        m.set_reference_time(REFERENCE);
        m.set_targets([1000, 2000], 10);
        m.begin_run();
        m.evaluate(0);
        assert_eq!(
            m.diagnostics(),
            &[BasisWarning::RelativeLookingTargets { smallest: 1000 }]
        );
    }

    #[test]
    fn test_diagnostics_rearm_per_run() {
        let mut m = matcher(&[REFERENCE + 1000], 10);
        m.evaluate(0);
        assert_eq!(m.diagnostics().len(), 1);

        m.begin_run();
        assert!(m.diagnostics().is_empty());
        m.evaluate(0);
        assert_eq!(m.diagnostics().len(), 1);
    }

    #[test]
    fn test_relative_mode_has_no_diagnostics() {
        let mut m = matcher(&[1000], 10);
        m.evaluate(0);
        assert!(m.diagnostics().is_empty());
    }
}
