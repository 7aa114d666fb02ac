//! Free-slot search over working-hours windows.
//!
//! For each local day in the requested range the working window is computed,
//! participating events near it are padded by the buffer policy, merged, and
//! the gaps between them that are at least the requested duration are
//! emitted. Days are processed lazily, one at a time, so callers that only
//! need the first few slots never sweep the whole range.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::buffer::BufferPolicy;
use crate::dst::DstPolicy;
use crate::error::{Result, ScheduleError};
use crate::hours::working_window;
use crate::interval::IntervalIndex;
use crate::model::{Slot, TimeRange, WorkingHours};
use crate::snapshot::Snapshot;

/// Inclusive range of local dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Fails with `InvalidRange` when `end < start`. A single day has
    /// `start == end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(ScheduleError::InvalidRange(format!(
                "date range ends {} before it starts {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Number of days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A complete free-slot request.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotQuery {
    pub calendar_id: Uuid,
    pub user_id: Uuid,
    pub range: DateRange,
    pub duration_minutes: i64,
    /// Skip Saturdays and Sundays (local dates).
    pub exclude_weekends: bool,
}

impl SlotQuery {
    pub fn new(calendar_id: Uuid, user_id: Uuid, range: DateRange, duration_minutes: i64) -> Self {
        Self {
            calendar_id,
            user_id,
            range,
            duration_minutes,
            exclude_weekends: false,
        }
    }

    pub fn exclude_weekends(mut self, exclude: bool) -> Self {
        self.exclude_weekends = exclude;
        self
    }
}

/// Free slots of at least `duration_minutes` in `calendar_id` over `range`,
/// using the working hours and buffer of `user_id`.
///
/// No availability is an empty iterator, not an error.
pub fn find_slots(
    snapshot: &Snapshot,
    calendar_id: Uuid,
    user_id: Uuid,
    range: DateRange,
    duration_minutes: i64,
) -> Result<SlotIter<'_>> {
    find_slots_with(
        snapshot,
        &SlotQuery::new(calendar_id, user_id, range, duration_minutes),
    )
}

/// Full form of [`find_slots`].
///
/// # Errors
/// `InvalidRange` for a non-positive duration or a range longer than
/// `max_range_days`, `NotFound` for an unknown calendar or user,
/// `InvalidTimezone` for an unknown timezone name.
pub fn find_slots_with<'a>(snapshot: &'a Snapshot, query: &SlotQuery) -> Result<SlotIter<'a>> {
    if query.duration_minutes <= 0 {
        return Err(ScheduleError::InvalidRange(format!(
            "slot duration must be positive, got {} minutes",
            query.duration_minutes
        )));
    }
    let max_days = i64::from(snapshot.config().max_range_days);
    if query.range.days() > max_days {
        return Err(ScheduleError::InvalidRange(format!(
            "date range covers {} days, limit is {}",
            query.range.days(),
            max_days
        )));
    }

    let calendar = snapshot.calendar(query.calendar_id)?;
    let index = snapshot.index(query.calendar_id)?;
    let settings = snapshot.user(query.user_id)?;
    let tz = snapshot.calendar_timezone(calendar)?;
    let hours = snapshot.working_hours(settings);
    let buffer = snapshot.buffer(settings);

    tracing::debug!(
        calendar = %query.calendar_id,
        user = %query.user_id,
        from = %query.range.start,
        to = %query.range.end,
        duration = query.duration_minutes,
        buffer = buffer.minutes,
        tz = tz.name(),
        "free-slot search"
    );

    // A length chrono cannot represent is longer than any working window.
    let duration = Duration::try_minutes(query.duration_minutes);
    if duration.is_none() {
        tracing::debug!(
            duration = query.duration_minutes,
            "duration exceeds any window, no slots"
        );
    }

    Ok(SlotIter {
        index,
        tz,
        hours,
        buffer,
        dst: snapshot.config().dst,
        duration: duration.unwrap_or_else(Duration::zero),
        exclude_weekends: query.exclude_weekends,
        next_day: duration.map(|_| query.range.start),
        last_day: query.range.end,
        pending: VecDeque::new(),
    })
}

/// First slot of [`find_slots`], if any.
pub fn find_first_slot(
    snapshot: &Snapshot,
    calendar_id: Uuid,
    user_id: Uuid,
    range: DateRange,
    duration_minutes: i64,
) -> Result<Option<Slot>> {
    Ok(find_slots(snapshot, calendar_id, user_id, range, duration_minutes)?.next())
}

/// Lazy, chronologically ordered free slots. Re-running the same query on the
/// same snapshot yields the same sequence.
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    index: &'a IntervalIndex,
    tz: Tz,
    hours: WorkingHours,
    buffer: BufferPolicy,
    dst: DstPolicy,
    duration: Duration,
    exclude_weekends: bool,
    next_day: Option<NaiveDate>,
    last_day: NaiveDate,
    pending: VecDeque<Slot>,
}

impl SlotIter<'_> {
    fn advance_day(&mut self) -> Option<NaiveDate> {
        let day = self.next_day?;
        self.next_day = if day < self.last_day {
            day.succ_opt()
        } else {
            None
        };
        Some(day)
    }

    fn slots_for_day(&self, day: NaiveDate) -> Vec<Slot> {
        if self.exclude_weekends && matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            return Vec::new();
        }
        let Some(window) = working_window(self.tz, day, self.hours, self.dst) else {
            tracing::debug!(%day, "no working window, skipping day");
            return Vec::new();
        };

        // Anything within one buffer of the window can still push into it.
        let reach = self.buffer.expand(window);
        let padded: Vec<TimeRange> = self
            .index
            .query_overlaps(&reach)
            .map(|e| self.buffer.expand(e.range()))
            .collect();
        let busy = merge_busy_periods(&padded, &window);

        let slots: Vec<Slot> = free_gaps(&busy, &window)
            .into_iter()
            .filter(|slot| slot.end - slot.start >= self.duration)
            .collect();
        tracing::debug!(%day, busy = busy.len(), slots = slots.len(), "day swept");
        slots
    }
}

impl Iterator for SlotIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        loop {
            if let Some(slot) = self.pending.pop_front() {
                return Some(slot);
            }
            let day = self.advance_day()?;
            let slots = self.slots_for_day(day);
            self.pending.extend(slots);
        }
    }
}

impl FusedIterator for SlotIter<'_> {}

/// Merge overlapping or adjacent busy periods, clipped to `window`.
///
/// Returns a sorted, non-overlapping list of intervals.
pub fn merge_busy_periods(intervals: &[TimeRange], window: &TimeRange) -> Vec<TimeRange> {
    // Clip to the window, discarding intervals entirely outside.
    let mut clipped: Vec<TimeRange> = intervals
        .iter()
        .filter(|r| r.overlaps(window))
        .map(|r| TimeRange {
            start: r.start.max(window.start),
            end: r.end.min(window.end),
        })
        .collect();

    clipped.sort();

    let mut merged: Vec<TimeRange> = Vec::with_capacity(clipped.len());
    for range in clipped {
        if let Some(last) = merged.last_mut() {
            if range.start <= last.end {
                last.end = last.end.max(range.end);
                continue;
            }
        }
        merged.push(range);
    }

    merged
}

/// Gaps of `window` not covered by the sorted, merged `busy` periods.
pub fn free_gaps(busy: &[TimeRange], window: &TimeRange) -> Vec<Slot> {
    let mut gaps = Vec::new();
    let mut cursor: DateTime<Utc> = window.start;

    for period in busy {
        if cursor < period.start {
            gaps.push(Slot::from_bounds(cursor, period.start));
        }
        cursor = cursor.max(period.end);
    }

    if cursor < window.end {
        gaps.push(Slot::from_bounds(cursor, window.end));
    }

    gaps
}
