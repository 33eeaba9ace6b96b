//! Sorted target timestamps with a shared tolerance.

use contracts::{ExtractError, Timestamp, TimestampValue};

/// Target timestamps, always sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<Timestamp>,
    tolerance: Timestamp,
}

impl TargetSet {
    /// Create a sorted target set
    pub fn new(targets: impl IntoIterator<Item = Timestamp>, tolerance: Timestamp) -> Self {
        let mut targets: Vec<Timestamp> = targets.into_iter().collect();
        targets.sort_unstable();
        Self { targets, tolerance }
    }

    /// Create from numeric or textual values
    ///
    /// Fails on the first value that does not parse; nothing is kept in that case.
    pub fn from_values(
        values: &[TimestampValue],
        tolerance: Timestamp,
    ) -> Result<Self, ExtractError> {
        let targets = values
            .iter()
            .map(TimestampValue::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(targets, tolerance))
    }

    /// Create from textual values
    pub fn from_strs<S: AsRef<str>>(
        values: &[S],
        tolerance: Timestamp,
    ) -> Result<Self, ExtractError> {
        let targets = values
            .iter()
            .map(|s| contracts::parse_timestamp(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(targets, tolerance))
    }

    /// Add a single target, keeping the order
    pub fn insert(&mut self, target: Timestamp) {
        let pos = self.targets.partition_point(|&t| t <= target);
        self.targets.insert(pos, target);
    }

    pub fn as_slice(&self) -> &[Timestamp] {
        &self.targets
    }

    pub fn tolerance(&self) -> Timestamp {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Smallest target
    pub fn first(&self) -> Option<Timestamp> {
        self.targets.first().copied()
    }

    /// Largest target
    pub fn last(&self) -> Option<Timestamp> {
        self.targets.last().copied()
    }

    /// Whether `effective` lies inside the tolerance window of `target`.
    ///
    /// The window is exclusive (`|effective - target| < tolerance`);
    /// exact equality always matches, so a zero tolerance selects exact hits only.
    #[inline]
    pub fn within(&self, effective: Timestamp, target: Timestamp) -> bool {
        let diff = effective.abs_diff(target);
        diff == 0 || diff < self.tolerance
    }

    /// First target, in ascending order, whose window contains `effective`
    pub fn first_match(&self, effective: Timestamp) -> Option<Timestamp> {
        self.targets
            .iter()
            .copied()
            .find(|&target| self.within(effective, target))
    }

    /// True once `effective` and every later timestamp are outside all windows
    ///
    /// Cuts off at `max + tolerance` rather than `> max`, so frames just past
    /// the largest target but inside its window are still kept.
    pub fn beyond_reach(&self, effective: Timestamp) -> bool {
        match self.last() {
            Some(max) => effective > max && effective - max >= self.tolerance,
            None => false,
        }
    }
}
