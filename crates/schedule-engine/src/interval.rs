//! Per-calendar ordered interval index.
//!
//! Events are kept sorted by `(start, end, id)` next to a prefix-maximum of
//! their end instants. An overlap query binary-searches the start column for
//! the last candidate, then binary-searches the prefix maximum for the first
//! event that can still reach the query start, and scans only between the two.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::{Event, TimeRange};

#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    events: Vec<Event>,
    /// `max_end[i]` is the latest end among `events[..=i]`.
    max_end: Vec<DateTime<Utc>>,
    /// `(start, end)` of every indexed id, for binary-searched id lookups.
    keys: HashMap<Uuid, (DateTime<Utc>, DateTime<Utc>)>,
}

fn sort_key(e: &Event) -> (DateTime<Utc>, DateTime<Utc>, Uuid) {
    (e.start, e.end, e.id)
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from an unordered set of events. A repeated id keeps
    /// the last event given for it.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Event>,
    {
        let mut by_id: HashMap<Uuid, Event> = HashMap::new();
        for event in events {
            by_id.insert(event.id, event);
        }
        let keys = by_id
            .values()
            .map(|e| (e.id, (e.start, e.end)))
            .collect();
        let mut events: Vec<Event> = by_id.into_values().collect();
        events.sort_by_key(sort_key);
        let mut index = Self {
            events,
            max_end: Vec::new(),
            keys,
        };
        index.rebuild_max_end(0);
        index
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in `(start, end, id)` order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Event> {
        self.position(id).map(|pos| &self.events[pos])
    }

    /// Insert `event`, replacing any event with the same id.
    pub fn insert(&mut self, event: Event) {
        let replaced = self.position(event.id).map(|pos| {
            self.events.remove(pos);
            pos
        });
        let key = sort_key(&event);
        let pos = self.events.partition_point(|e| sort_key(e) < key);
        self.keys.insert(event.id, (event.start, event.end));
        self.events.insert(pos, event);
        self.rebuild_max_end(replaced.map_or(pos, |r| r.min(pos)));
    }

    /// Remove the event with `id`, returning it if present.
    pub fn remove(&mut self, id: Uuid) -> Option<Event> {
        let pos = self.position(id)?;
        self.keys.remove(&id);
        let removed = self.events.remove(pos);
        self.rebuild_max_end(pos);
        Some(removed)
    }

    /// All indexed events intersecting the half-open range, in index order.
    ///
    /// An event ending exactly at `range.start` or starting exactly at
    /// `range.end` is not returned.
    pub fn query_overlaps(&self, range: &TimeRange) -> impl Iterator<Item = &Event> + '_ {
        let (lower, upper) = self.candidate_bounds(range.start, range.end);
        let start = range.start;
        self.events[lower..upper]
            .iter()
            .filter(move |e| e.end > start)
    }

    /// `[lower, upper)` slice of `events` that can intersect `[start, end)`.
    fn candidate_bounds(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> (usize, usize) {
        let upper = self.events.partition_point(|e| e.start < end);
        let lower = self.max_end[..upper].partition_point(|m| *m <= start);
        tracing::trace!(lower, upper, total = self.events.len(), "interval index pruned");
        (lower, upper)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        let &(start, end) = self.keys.get(&id)?;
        let key = (start, end, id);
        let pos = self.events.partition_point(|e| sort_key(e) < key);
        self.events.get(pos).filter(|e| e.id == id).map(|_| pos)
    }

    fn rebuild_max_end(&mut self, from: usize) {
        self.max_end.truncate(from);
        let mut running = self.max_end.last().copied();
        for event in &self.events[from..] {
            let next = match running {
                Some(m) => m.max(event.end),
                None => event.end,
            };
            self.max_end.push(next);
            running = Some(next);
        }
    }
}
