//! RawFrame - FrameSource output
//!
//! Borrowed views into the source's decode buffers. A view is only valid
//! until the next `advance()` call, the borrow checker enforces this.

use crate::{micros_to_millis, Timestamp};

/// Interleaved 3-channel 8-bit color buffer
#[derive(Debug, Clone, Copy)]
pub struct ColorBuffer<'a> {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major
    pub data: &'a [u8],
}

/// Pixel-space depth buffer
#[derive(Debug, Clone, Copy)]
pub struct DepthBuffer<'a> {
    pub width: u32,
    pub height: u32,
    /// `width * height` samples, row-major
    pub data: &'a [u16],
}

impl DepthBuffer<'_> {
    /// Depth sample at pixel (x, y)
    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> u16 {
        self.data[(x + y * self.width) as usize]
    }
}

/// One position of the recording
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Stream timestamp in microseconds
    pub timestamp_us: u64,
    pub color: ColorBuffer<'a>,
    pub depth: DepthBuffer<'a>,
}

impl RawFrame<'_> {
    /// Stream timestamp truncated to milliseconds
    #[inline]
    pub fn timestamp_ms(&self) -> Timestamp {
        micros_to_millis(self.timestamp_us)
    }
}
