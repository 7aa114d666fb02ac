//! Working-hours validation.
//!
//! A candidate interval is inside working hours when, in the resolved local
//! timezone, it starts no earlier than the window start and ends no later than
//! the window end on the same local date. Intervals spanning two local dates
//! are rejected with `InvalidRange` rather than partially validated.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::dst::{resolve_local, DstPolicy};
use crate::error::{Result, ScheduleError};
use crate::model::{TimeRange, WorkingHours};
use crate::snapshot::Snapshot;

/// Whether `[start, end)` lies inside the working hours of `user_id`, using
/// the user's timezone (or the configured default).
///
/// # Errors
/// `NotFound` when the user has no settings record in the snapshot,
/// `InvalidRange` for `end <= start` or a multi-day interval,
/// `InvalidTimezone` for an unknown timezone name.
pub fn is_within(
    snapshot: &Snapshot,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool> {
    let range = TimeRange::new(start, end)?;
    let settings = snapshot.user(user_id)?;
    let tz = snapshot.user_timezone(settings)?;
    check_window(tz, snapshot.working_hours(settings), &range)
}

/// Like [`is_within`], for the owner of `calendar_id` and in the calendar's
/// timezone.
pub fn is_within_calendar(
    snapshot: &Snapshot,
    calendar_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool> {
    let range = TimeRange::new(start, end)?;
    let calendar = snapshot.calendar(calendar_id)?;
    let settings = snapshot.user(calendar.user_id)?;
    let tz = snapshot.calendar_timezone(calendar)?;
    check_window(tz, snapshot.working_hours(settings), &range)
}

/// Compare the local time-of-day of `range` against `hours` in `tz`.
pub fn check_window(tz: Tz, hours: WorkingHours, range: &TimeRange) -> Result<bool> {
    let local_start = range.start.with_timezone(&tz);
    let local_end = range.end.with_timezone(&tz);

    if local_start.date_naive() != local_end.date_naive() {
        return Err(ScheduleError::InvalidRange(format!(
            "interval spans local dates {} and {} in {}",
            local_start.date_naive(),
            local_end.date_naive(),
            tz.name()
        )));
    }

    Ok(hours.contains(local_start.time(), local_end.time()))
}

/// The UTC window covered by `hours` on local `date` in `tz`.
///
/// `None` when a boundary falls into a DST gap and `dst` is
/// [`DstPolicy::Skip`], or when the transition collapses the window.
pub fn working_window(
    tz: Tz,
    date: NaiveDate,
    hours: WorkingHours,
    dst: DstPolicy,
) -> Option<TimeRange> {
    let start = resolve_local(tz, date.and_time(hours.start), dst)?;
    let end = resolve_local(tz, date.and_time(hours.end), dst)?;
    TimeRange::new(start, end).ok()
}
