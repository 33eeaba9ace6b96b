//! Synthetic Source - 合成帧数据源
//!
//! 按给定的流时间戳列表生成确定性的彩色与深度帧，
//! 用于无需磁盘录制的测试和开发。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{
    ColorBuffer, DepthBuffer, FrameSource, RawFrame, RealWorldProjector, SourceError, Timestamp,
};
use tracing::{debug, trace};

use crate::projector::FovProjector;

/// 合成数据源配置
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// `recording_start` 报告的绝对起始时间
    pub start_time_ms: Option<Timestamp>,
    /// 使 `open()` 失败
    pub fail_open: bool,
    /// 在该位置使 `advance()` 失败
    pub fail_at: Option<usize>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 3,
            start_time_ms: None,
            fail_open: false,
            fail_at: None,
        }
    }
}

/// 共享调用计数器，数据源被装箱后仍可读取
#[derive(Debug, Clone, Default)]
pub struct SourceStats {
    opens: Arc<AtomicUsize>,
    advances: Arc<AtomicUsize>,
    rewinds: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl SourceStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::Relaxed)
    }

    pub fn rewinds(&self) -> usize {
        self.rewinds.load(Ordering::Relaxed)
    }

    /// 实际释放了已打开流的次数
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }
}

/// 合成数据源
///
/// 第 `i` 帧像素 `p` 的颜色为 `[i, p, i + p]` (回绕)，深度为
/// `1000 + 10 * i + p`，便于测试识别保留的是哪一帧。
#[derive(Debug)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    timestamps_us: Vec<u64>,
    open: bool,
    cursor: usize,
    color: Vec<u8>,
    depth: Vec<u16>,
    stats: SourceStats,
}

impl SyntheticSource {
    pub fn new(timestamps_us: Vec<u64>, config: SyntheticConfig) -> Self {
        Self {
            config,
            timestamps_us,
            open: false,
            cursor: 0,
            color: Vec::new(),
            depth: Vec::new(),
            stats: SourceStats::default(),
        }
    }

    /// 使用默认配置，时间戳以毫秒给出
    pub fn from_millis(timestamps_ms: impl IntoIterator<Item = Timestamp>) -> Self {
        let timestamps_us = timestamps_ms.into_iter().map(|ms| ms * 1000).collect();
        Self::new(timestamps_us, SyntheticConfig::default())
    }

    /// 从 `first_ms` 开始，间隔 `interval_ms` 的 `count` 帧
    pub fn evenly_spaced(first_ms: Timestamp, interval_ms: Timestamp, count: usize) -> Self {
        Self::from_millis((0..count as u64).map(|i| first_ms + i * interval_ms))
    }

    pub fn with_start_time(mut self, start_time_ms: Timestamp) -> Self {
        self.config.start_time_ms = Some(start_time_ms);
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.config.fail_open = true;
        self
    }

    pub fn failing_at(mut self, position: usize) -> Self {
        self.config.fail_at = Some(position);
        self
    }

    pub fn stats(&self) -> SourceStats {
        self.stats.clone()
    }

    /// 第 `index` 帧像素 `pixel` 的预期深度
    pub fn depth_value(index: usize, pixel: usize) -> u16 {
        (1000 + 10 * index + pixel) as u16
    }

    /// 第 `index` 帧像素 `pixel` 的预期颜色
    pub fn color_value(index: usize, pixel: usize) -> [u8; 3] {
        [index as u8, pixel as u8, (index + pixel) as u8]
    }

    fn render(&mut self, index: usize) {
        let pixels = self.config.width as usize * self.config.height as usize;

        self.color.clear();
        self.color
            .extend((0..pixels).flat_map(|p| Self::color_value(index, p)));

        self.depth.clear();
        self.depth
            .extend((0..pixels).map(|p| Self::depth_value(index, p)));
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self) -> Result<usize, SourceError> {
        self.stats.opens.fetch_add(1, Ordering::Relaxed);
        if self.config.fail_open {
            return Err(SourceError::Open {
                path: "synthetic".to_string(),
                message: "configured to fail".to_string(),
            });
        }

        self.open = true;
        self.cursor = 0;
        debug!(frames = self.timestamps_us.len(), "Synthetic source opened");
        Ok(self.timestamps_us.len())
    }

    fn frame_count(&self) -> usize {
        if self.open {
            self.timestamps_us.len()
        } else {
            0
        }
    }

    fn advance(&mut self) -> Result<RawFrame<'_>, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        let position = self.cursor;
        if position >= self.timestamps_us.len() {
            return Err(SourceError::EndOfStream {
                frame_count: self.timestamps_us.len(),
            });
        }
        if self.config.fail_at == Some(position) {
            return Err(SourceError::decode(position, "configured to fail"));
        }

        self.stats.advances.fetch_add(1, Ordering::Relaxed);
        self.render(position);
        self.cursor += 1;
        trace!(position, "Synthetic frame generated");

        Ok(RawFrame {
            timestamp_us: self.timestamps_us[position],
            color: ColorBuffer {
                width: self.config.width,
                height: self.config.height,
                data: &self.color,
            },
            depth: DepthBuffer {
                width: self.config.width,
                height: self.config.height,
                data: &self.depth,
            },
        })
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        self.stats.rewinds.fetch_add(1, Ordering::Relaxed);
        self.cursor = 0;
        Ok(())
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.stats.releases.fetch_add(1, Ordering::Relaxed);
            debug!("Synthetic source released");
        }
    }

    fn recording_start(&self) -> Option<Timestamp> {
        self.config.start_time_ms
    }

    fn projector(&self) -> Option<Box<dyn RealWorldProjector>> {
        Some(Box::new(FovProjector::with_default_fov(
            self.config.width,
            self.config.height,
        )))
    }
}
