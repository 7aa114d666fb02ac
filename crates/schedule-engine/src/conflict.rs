//! Strict conflict detection against a calendar's participating events.
//!
//! Two intervals conflict iff `a.start < b.end && b.start < a.end`. Adjacent
//! events (one ends exactly when the other starts) are NOT conflicts, and the
//! buffer policy is never applied here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Event, TimeRange};
use crate::snapshot::Snapshot;

/// An existing event overlapping a proposed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub event: Event,
    pub overlap_minutes: i64,
}

/// Two events of the same calendar that overlap each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapPair {
    pub event_a: Event,
    pub event_b: Event,
    pub overlap_minutes: i64,
}

/// Events of `calendar_id` overlapping `[start, end)`, ordered by start.
///
/// `exclude` drops one event from the result, so an update can be checked
/// against everything except the event being moved.
///
/// # Errors
/// `InvalidRange` when `end <= start`, `NotFound` for an unknown calendar.
pub fn find_conflicts(
    snapshot: &Snapshot,
    calendar_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Result<Vec<Conflict>> {
    let proposed = TimeRange::new(start, end)?;
    let index = snapshot.index(calendar_id)?;

    let conflicts: Vec<Conflict> = index
        .query_overlaps(&proposed)
        .filter(|e| Some(e.id) != exclude)
        .map(|e| Conflict {
            event: e.clone(),
            overlap_minutes: proposed.overlap_minutes(&e.range()),
        })
        .collect();

    tracing::debug!(
        calendar = %calendar_id,
        start = %proposed.start,
        end = %proposed.end,
        conflicts = conflicts.len(),
        "conflict check"
    );

    Ok(conflicts)
}

/// Ids of the events conflicting with `[start, end)`. Empty when free.
pub fn check(
    snapshot: &Snapshot,
    calendar_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Result<BTreeSet<Uuid>> {
    Ok(find_conflicts(snapshot, calendar_id, start, end, exclude)?
        .into_iter()
        .map(|c| c.event.id)
        .collect())
}

/// Every pair of participating events in `calendar_id` that overlap.
///
/// Sweeps the index in start order keeping the events still open at each
/// start, so the cost is proportional to the events plus the pairs reported.
pub fn overlapping_pairs(snapshot: &Snapshot, calendar_id: Uuid) -> Result<Vec<OverlapPair>> {
    let index = snapshot.index(calendar_id)?;

    let mut pairs = Vec::new();
    let mut active: Vec<&Event> = Vec::new();
    for event in index.iter() {
        active.retain(|open| open.end > event.start);
        for open in &active {
            pairs.push(OverlapPair {
                event_a: (*open).clone(),
                event_b: event.clone(),
                overlap_minutes: open.range().overlap_minutes(&event.range()),
            });
        }
        active.push(event);
    }

    Ok(pairs)
}
