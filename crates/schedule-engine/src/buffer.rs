//! Minimum idle time around occupied intervals.
//!
//! Padding applies to free-slot search only. Strict conflict checks in
//! [`crate::conflict`] always compare the raw event intervals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferPolicy {
    pub minutes: u32,
}

impl BufferPolicy {
    pub fn new(minutes: u32) -> Self {
        Self { minutes }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }

    /// Widen `range` by the buffer on both sides.
    pub fn expand(&self, range: TimeRange) -> TimeRange {
        expand(range, self.minutes)
    }
}

/// Widen `range` by `buffer_minutes` on both sides. A zero buffer returns the
/// range unchanged. Bounds saturate at the limits of [`DateTime<Utc>`].
pub fn expand(range: TimeRange, buffer_minutes: u32) -> TimeRange {
    let pad = Duration::minutes(i64::from(buffer_minutes));
    TimeRange {
        start: range
            .start
            .checked_sub_signed(pad)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        end: range
            .end
            .checked_add_signed(pad)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}
