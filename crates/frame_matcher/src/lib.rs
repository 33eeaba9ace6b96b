//! # Frame Matcher
//!
//! Timestamp matching for single-pass frame selection.
//!
//! Responsible for:
//! - Keeping the target timestamps sorted with a shared tolerance
//! - Reconciling relative stream timestamps with absolute targets
//! - Deciding keep / skip / stop for each stream timestamp
//! - Raising basis diagnostics once per run
//!
//! ## Example
//!
//! ```
//! use frame_matcher::{TimestampMatcher, Verdict};
//!
//! let mut matcher = TimestampMatcher::new();
//! matcher.set_targets([2000, 1000], 50);
//! matcher.begin_run();
//!
//! assert_eq!(matcher.evaluate(990), Verdict::Keep { timestamp: 990 });
//! assert_eq!(matcher.evaluate(1500), Verdict::Skip);
//! assert_eq!(matcher.evaluate(2050), Verdict::Stop);
//! ```

mod matcher;
mod target_set;

pub use matcher::{TimestampMatcher, Verdict};
pub use target_set::TargetSet;

// Re-export contracts types
pub use contracts::{BasisWarning, Timestamp, TimestampBasis, TimestampValue};
