//! FrameSource / RealWorldProjector traits - external collaborator abstraction
//!
//! Decouples the extraction engine from concrete recording decoders.
//! Directory replays and synthetic in-memory sources use the same API.

use crate::{Point3, RawFrame, SourceError, Timestamp};

/// Sequential color + depth recording
///
/// # Lifecycle
///
/// 1. `open()` acquires decoder resources and reports the frame count
/// 2. `advance()` is called once per position, `rewind()` returns to position 0
/// 3. `release()` frees resources; calling it again is a no-op
///
/// # Example
///
/// ```ignore
/// let count = source.open()?;
/// for _ in 0..count {
///     let frame = source.advance()?;
///     println!("{} us", frame.timestamp_us);
/// }
/// source.release();
/// ```
pub trait FrameSource {
    /// Open the underlying stream, returning the total frame count
    fn open(&mut self) -> Result<usize, SourceError>;

    /// Total frame count, 0 until opened
    fn frame_count(&self) -> usize;

    /// Decode the next position.
    ///
    /// Blocking. Timestamps are monotonically non-decreasing across calls.
    /// The returned buffers are invalidated by the next call.
    fn advance(&mut self) -> Result<RawFrame<'_>, SourceError>;

    /// Seek back to the first position
    fn rewind(&mut self) -> Result<(), SourceError>;

    /// Stop generation and free resources. Idempotent.
    fn release(&mut self);

    /// Absolute start time of the recording, if the format stores one
    fn recording_start(&self) -> Option<Timestamp> {
        None
    }

    /// Projector matching this source's depth calibration, available after `open()`
    fn projector(&self) -> Option<Box<dyn RealWorldProjector>> {
        None
    }
}

/// Projective-to-real-world transform of a depth sensor
///
/// Pure and deterministic for a given calibration.
pub trait RealWorldProjector: Send + Sync {
    /// Convert `(x, y, depth)` pixel-space points into real-world coordinates.
    ///
    /// Output has the same length and order as the input.
    fn project(&self, projective: &[Point3]) -> Vec<Point3>;
}
