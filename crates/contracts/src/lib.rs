//! # Contracts
//!
//! Shared interface contracts for RGB-D frame extraction.
//! All business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - `Timestamp` is an unsigned count of milliseconds
//! - Stream timestamps arrive in microseconds and are truncated to milliseconds for matching
//! - A timestamp is either relative (0 = recording start) or absolute (Unix epoch)

mod config;
mod diagnostics;
mod error;
mod frame;
mod images;
mod result;
mod source;
mod timestamp;

pub use config::*;
pub use diagnostics::BasisWarning;
pub use error::*;
pub use frame::{ColorBuffer, DepthBuffer, RawFrame};
pub use images::*;
pub use result::{ExtractionReport, ExtractionResult, ScanOutcome};
pub use source::{FrameSource, RealWorldProjector};
pub use timestamp::*;
