//! Accumulated extraction output.

use contracts::{ColorImage, ExtractionResult, RealWorldImage, Timestamp};

/// What happens to stored frames when a run begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Start from empty
    Replace,
    /// Keep frames of previous runs
    Append,
}

impl StoreMode {
    pub fn from_append(append: bool) -> Self {
        if append {
            Self::Append
        } else {
            Self::Replace
        }
    }
}

/// Frame store
///
/// Owns the three parallel sequences of an `ExtractionResult`; callers only
/// ever receive copies.
#[derive(Debug, Clone, Default)]
pub struct FrameStore {
    result: ExtractionResult,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for a run
    pub fn begin_run(&mut self, mode: StoreMode) {
        if mode == StoreMode::Replace {
            self.clear();
        }
    }

    /// Append one accepted frame
    pub fn push(&mut self, color: ColorImage, real_world: RealWorldImage, timestamp: Timestamp) {
        self.result.color.push(color);
        self.result.real_world.push(real_world);
        self.result.timestamps.push(timestamp);
    }

    pub fn clear(&mut self) {
        self.result.color.clear();
        self.result.real_world.clear();
        self.result.timestamps.clear();
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn color(&self) -> &[ColorImage] {
        &self.result.color
    }

    pub fn real_world(&self) -> &[RealWorldImage] {
        &self.result.real_world
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.result.timestamps
    }

    /// Independent copy of everything stored
    pub fn snapshot(&self) -> ExtractionResult {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_frame(store: &mut FrameStore, ts: Timestamp) {
        store.push(
            ColorImage::new(1, 1),
            RealWorldImage::new(1, 1),
            ts,
        );
    }

    #[test]
    fn test_replace_clears() {
        let mut store = FrameStore::new();
        push_frame(&mut store, 1);
        push_frame(&mut store, 2);

        store.begin_run(StoreMode::Replace);
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_keeps() {
        let mut store = FrameStore::new();
        push_frame(&mut store, 1);

        store.begin_run(StoreMode::Append);
        push_frame(&mut store, 2);
        assert_eq!(store.timestamps(), &[1, 2]);
        assert_eq!(store.color().len(), 2);
        assert_eq!(store.real_world().len(), 2);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = FrameStore::new();
        push_frame(&mut store, 7);
        let snapshot = store.snapshot();

        store.clear();
        assert_eq!(snapshot.timestamps, vec![7]);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(StoreMode::from_append(true), StoreMode::Append);
        assert_eq!(StoreMode::from_append(false), StoreMode::Replace);
    }
}
