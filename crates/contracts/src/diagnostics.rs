//! Non-fatal basis diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Likely mix-up between relative and absolute timestamps.
///
/// Advisory only: extraction proceeds regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BasisWarning {
    /// Absolute matching is active but no reference time was set
    MissingReference,
    /// Absolute matching is active but the smallest target looks relative
    RelativeLookingTargets { smallest: Timestamp },
}

impl fmt::Display for BasisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReference => write!(
                f,
                "absolute timestamps in use but no reference time set, stream timestamps stay relative"
            ),
            Self::RelativeLookingTargets { smallest } => write!(
                f,
                "reference time set but target {smallest} looks like a relative timestamp"
            ),
        }
    }
}
