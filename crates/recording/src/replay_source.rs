//! Replay Source - 从录制目录逐帧回放 RGB-D 数据
//!
//! 目录结构：
//!
//! ```text
//! <root>/manifest.json        流元数据
//! <root>/frames.jsonl         每帧一条记录
//! <root>/<color_file>         原始 RGB，每像素 3 字节
//! <root>/<depth_file>         原始 u16 小端深度
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{
    ColorBuffer, DepthBuffer, FrameSource, RawFrame, RealWorldProjector, SourceError, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::projector::FovProjector;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FRAMES_FILE: &str = "frames.jsonl";
pub const MANIFEST_VERSION: &str = "1.0";

/// 录制会话 manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingManifest {
    pub version: String,
    pub created_at: String,
    /// 首帧的墙钟时间 (Unix 毫秒)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<Timestamp>,
    pub frame_count: usize,
    pub color: ColorStreamInfo,
    pub depth: DepthStreamInfo,
}

/// 彩色流元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorStreamInfo {
    pub width: u32,
    pub height: u32,
}

/// 深度流元数据 (含视场角，弧度)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthStreamInfo {
    pub width: u32,
    pub height: u32,
    pub horizontal_fov: f32,
    pub vertical_fov: f32,
}

impl DepthStreamInfo {
    pub fn projector(&self) -> FovProjector {
        FovProjector::new(
            self.width,
            self.height,
            self.horizontal_fov,
            self.vertical_fov,
        )
    }
}

/// frames.jsonl 中的帧记录
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrameRecord {
    index: u64,
    timestamp_us: u64,
    color_file: String,
    depth_file: String,
}

/// 读取并解析 `root` 下的 manifest.json
pub fn read_manifest(root: &Path) -> Result<RecordingManifest, SourceError> {
    let path = root.join(MANIFEST_FILE);
    let text = fs::read_to_string(&path).map_err(|e| SourceError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&text)
        .map_err(|e| SourceError::malformed(format!("{MANIFEST_FILE}: {e}")))
}

fn read_records(root: &Path) -> Result<Vec<FrameRecord>, SourceError> {
    let path = root.join(FRAMES_FILE);
    let file = File::open(&path).map_err(|e| SourceError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line).map_err(|e| {
            SourceError::malformed(format!("{FRAMES_FILE} line {}: {e}", line_no + 1))
        })?;
        records.push(record);
    }

    // 按录制帧序排序
    records.sort_by_key(|r| r.index);
    Ok(records)
}

/// Replay Source - 从录制目录回放帧
///
/// 帧缓冲区在多次 `advance` 调用间复用，返回的 `RawFrame`
/// 借用它们直到下一次调用。
#[derive(Debug)]
pub struct ReplaySource {
    root: PathBuf,
    manifest: Option<RecordingManifest>,
    records: Vec<FrameRecord>,
    cursor: usize,
    color: Vec<u8>,
    depth: Vec<u16>,
}

impl ReplaySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: None,
            records: Vec::new(),
            cursor: 0,
            color: Vec::new(),
            depth: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 已打开录制的 manifest
    pub fn manifest(&self) -> Option<&RecordingManifest> {
        self.manifest.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.manifest.is_some()
    }

    /// 读取指定位置的彩色与深度载荷，校验大小
    fn load_frame(&mut self, position: usize) -> Result<Timestamp, SourceError> {
        let manifest = self.manifest.as_ref().ok_or(SourceError::NotOpen)?;
        let record = &self.records[position];

        let color_len = manifest.color.width as usize * manifest.color.height as usize * 3;
        let depth_len = manifest.depth.width as usize * manifest.depth.height as usize;

        let color_bytes = fs::read(self.root.join(&record.color_file))
            .map_err(|e| SourceError::decode(position, format!("{}: {e}", record.color_file)))?;
        if color_bytes.len() != color_len {
            return Err(SourceError::decode(
                position,
                format!(
                    "{}: expected {color_len} bytes, found {}",
                    record.color_file,
                    color_bytes.len()
                ),
            ));
        }

        let depth_bytes = fs::read(self.root.join(&record.depth_file))
            .map_err(|e| SourceError::decode(position, format!("{}: {e}", record.depth_file)))?;
        if depth_bytes.len() != depth_len * 2 {
            return Err(SourceError::decode(
                position,
                format!(
                    "{}: expected {} bytes, found {}",
                    record.depth_file,
                    depth_len * 2,
                    depth_bytes.len()
                ),
            ));
        }

        self.color = color_bytes;
        self.depth.clear();
        self.depth.extend(
            depth_bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        );

        Ok(record.timestamp_us)
    }
}

impl FrameSource for ReplaySource {
    fn open(&mut self) -> Result<usize, SourceError> {
        let manifest = read_manifest(&self.root)?;
        let records = read_records(&self.root)?;

        if manifest.frame_count != records.len() {
            warn!(
                root = %self.root.display(),
                manifest = manifest.frame_count,
                records = records.len(),
                "Manifest frame count disagrees with frame index, using index"
            );
        }

        if records
            .windows(2)
            .any(|pair| pair[1].timestamp_us < pair[0].timestamp_us)
        {
            warn!(root = %self.root.display(), "Frame timestamps are not monotonic");
        }

        info!(
            root = %self.root.display(),
            frames = records.len(),
            color = %format!("{}x{}", manifest.color.width, manifest.color.height),
            depth = %format!("{}x{}", manifest.depth.width, manifest.depth.height),
            "Opened recording"
        );

        self.manifest = Some(manifest);
        self.records = records;
        self.cursor = 0;
        Ok(self.records.len())
    }

    fn frame_count(&self) -> usize {
        self.records.len()
    }

    fn advance(&mut self) -> Result<RawFrame<'_>, SourceError> {
        if self.manifest.is_none() {
            return Err(SourceError::NotOpen);
        }
        if self.cursor >= self.records.len() {
            return Err(SourceError::EndOfStream {
                frame_count: self.records.len(),
            });
        }

        let position = self.cursor;
        let timestamp_us = self.load_frame(position)?;
        self.cursor += 1;

        let manifest = self.manifest.as_ref().ok_or(SourceError::NotOpen)?;
        Ok(RawFrame {
            timestamp_us,
            color: ColorBuffer {
                width: manifest.color.width,
                height: manifest.color.height,
                data: &self.color,
            },
            depth: DepthBuffer {
                width: manifest.depth.width,
                height: manifest.depth.height,
                data: &self.depth,
            },
        })
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        if self.manifest.is_none() {
            return Err(SourceError::NotOpen);
        }
        self.cursor = 0;
        Ok(())
    }

    fn release(&mut self) {
        if self.manifest.take().is_some() {
            debug!(root = %self.root.display(), "Released recording");
        }
        self.records = Vec::new();
        self.color = Vec::new();
        self.depth = Vec::new();
        self.cursor = 0;
    }

    fn recording_start(&self) -> Option<Timestamp> {
        self.manifest.as_ref().and_then(|m| m.start_time_ms)
    }

    fn projector(&self) -> Option<Box<dyn RealWorldProjector>> {
        self.manifest
            .as_ref()
            .map(|m| Box::new(m.depth.projector()) as Box<dyn RealWorldProjector>)
    }
}

/// 录制写入器，生成 `ReplaySource` 可读取的目录结构
pub struct RecordingWriter {
    root: PathBuf,
    manifest: RecordingManifest,
    records: Vec<FrameRecord>,
}

impl RecordingWriter {
    /// 创建 `root` 目录 (含父目录) 并开始空录制
    pub fn create(
        root: impl Into<PathBuf>,
        color: ColorStreamInfo,
        depth: DepthStreamInfo,
        start_time_ms: Option<Timestamp>,
    ) -> Result<Self, SourceError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            manifest: RecordingManifest {
                version: MANIFEST_VERSION.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                start_time_ms,
                frame_count: 0,
                color,
                depth,
            },
            records: Vec::new(),
        })
    }

    /// 写入一帧的彩色与深度载荷
    pub fn write_frame(
        &mut self,
        timestamp_us: u64,
        color: &[u8],
        depth: &[u16],
    ) -> Result<(), SourceError> {
        let index = self.records.len() as u64;
        let color_expected =
            self.manifest.color.width as usize * self.manifest.color.height as usize * 3;
        let depth_expected =
            self.manifest.depth.width as usize * self.manifest.depth.height as usize;

        if color.len() != color_expected || depth.len() != depth_expected {
            return Err(SourceError::decode(
                index as usize,
                format!(
                    "frame payload sizes {}/{} do not match streams {color_expected}/{depth_expected}",
                    color.len(),
                    depth.len()
                ),
            ));
        }

        let color_file = format!("color/{index:06}.rgb");
        let depth_file = format!("depth/{index:06}.u16");
        fs::create_dir_all(self.root.join("color"))?;
        fs::create_dir_all(self.root.join("depth"))?;

        fs::write(self.root.join(&color_file), color)?;
        let depth_bytes: Vec<u8> = depth.iter().flat_map(|d| d.to_le_bytes()).collect();
        fs::write(self.root.join(&depth_file), depth_bytes)?;

        self.records.push(FrameRecord {
            index,
            timestamp_us,
            color_file,
            depth_file,
        });
        Ok(())
    }

    /// 写出帧索引和 manifest
    pub fn finish(mut self) -> Result<RecordingManifest, SourceError> {
        self.manifest.frame_count = self.records.len();

        let mut frames = BufWriter::new(File::create(self.root.join(FRAMES_FILE))?);
        for record in &self.records {
            let line = serde_json::to_string(record)
                .map_err(|e| SourceError::malformed(e.to_string()))?;
            writeln!(frames, "{line}")?;
        }
        frames.flush()?;

        let manifest = serde_json::to_string_pretty(&self.manifest)
            .map_err(|e| SourceError::malformed(e.to_string()))?;
        fs::write(self.root.join(MANIFEST_FILE), manifest)?;

        debug!(
            root = %self.root.display(),
            frames = self.records.len(),
            "Wrote recording"
        );
        Ok(self.manifest)
    }
}
