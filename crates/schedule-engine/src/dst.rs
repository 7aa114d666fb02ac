//! DST transition policies for turning local working-hours boundaries into
//! instants.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Upper bound on how far a boundary is pushed forward out of a DST gap.
const MAX_GAP_MINUTES: i64 = 180;

/// Policy for working-hours boundaries that fall inside a DST gap
/// (e.g. 02:30 during spring forward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the working window for that day.
    Skip,
    /// Move to the first valid local minute after the gap.
    #[default]
    ShiftForward,
}

/// Resolve a local wall-clock time in `tz` to a UTC instant.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Times inside a
/// gap follow `policy`; `None` means the boundary does not exist under it.
pub fn resolve_local(tz: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => {
                // Gaps end on a whole minute.
                let minute = local.with_second(0)?.with_nanosecond(0)?;
                (1..=MAX_GAP_MINUTES).find_map(|step| {
                    let probe = minute.checked_add_signed(Duration::minutes(step))?;
                    tz.from_local_datetime(&probe)
                        .earliest()
                        .map(|dt| dt.with_timezone(&Utc))
                })
            }
        },
    }
}
