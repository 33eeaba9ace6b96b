//! # Recording
//!
//! Frame sources for the extraction engine.
//!
//! - [`ReplaySource`]: directory recordings (`manifest.json` + `frames.jsonl` + raw payloads)
//! - [`SyntheticSource`]: deterministic in-memory frames for tests and demos
//! - [`FovProjector`]: field-of-view based real-world projection
//!
//! ## Example
//!
//! ```no_run
//! use contracts::FrameSource;
//! use recording::ReplaySource;
//!
//! let mut source = ReplaySource::new("/data/session_01");
//! let frames = source.open().unwrap();
//! println!("{frames} frames");
//! source.release();
//! ```

pub mod projector;
mod replay_source;
mod synthetic;

pub use projector::{FovProjector, DEFAULT_HORIZONTAL_FOV, DEFAULT_VERTICAL_FOV};
pub use replay_source::{
    read_manifest, ColorStreamInfo, DepthStreamInfo, RecordingManifest, RecordingWriter,
    ReplaySource, FRAMES_FILE, MANIFEST_FILE, MANIFEST_VERSION,
};
pub use synthetic::{SourceStats, SyntheticConfig, SyntheticSource};
