//! # Extractor
//!
//! Single-pass RGB-D frame extraction from recordings.
//!
//! Responsible for:
//! - Source lifecycle (`init` / `extract` / `release`)
//! - Consulting the timestamp matcher per frame, stopping early when possible
//! - Converting accepted frames into color and real-world images
//! - Accumulating results in replace or append mode
//!
//! ## Example
//!
//! ```ignore
//! use extractor::ExtractionEngine;
//!
//! let mut engine = ExtractionEngine::default();
//! engine.set_source(Box::new(source));
//! engine.set_targets([1000, 2000, 3000, 4000], 100);
//! engine.set_swap_red_blue(true);
//!
//! engine.init()?;
//! let report = engine.extract()?;
//! engine.release();
//!
//! let depth = engine.depth_images();
//! let timestamps = engine.timestamps();
//! ```

pub mod convert;
mod engine;
mod store;

pub use convert::{convert_color, convert_real_world, depth_from_real_world, projective_points};
pub use engine::{CancelHandle, ExtractionEngine};
pub use store::{FrameStore, StoreMode};

// Re-export contracts types
pub use contracts::{
    ExtractError, ExtractionOptions, ExtractionReport, ExtractionResult, ScanOutcome,
};
