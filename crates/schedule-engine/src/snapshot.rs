//! Immutable read model that every query runs against.
//!
//! A [`Snapshot`] owns one [`IntervalIndex`] per calendar holding the events
//! that occupy time under the configured [`TentativePolicy`]. Indexes sit
//! behind `Arc`, so the copy-on-write updates (`with_event`, `without_event`,
//! `without_calendar`) clone only the calendar they touch and a snapshot can be
//! shared read-only across threads while a writer prepares the next one.
//!
//! [`TentativePolicy`]: crate::policy::TentativePolicy

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::buffer::BufferPolicy;
use crate::config::{parse_tz, EngineConfig};
use crate::error::{Result, ScheduleError};
use crate::interval::IntervalIndex;
use crate::model::{Calendar, Event, TimeRange, UserSettings, WorkingHours};

/// Serialized form of a snapshot, as produced by the persistence layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    #[serde(default)]
    pub calendars: Vec<Calendar>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub users: Vec<UserSettings>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    config: Arc<EngineConfig>,
    calendars: HashMap<Uuid, Calendar>,
    users: HashMap<Uuid, UserSettings>,
    indexes: HashMap<Uuid, Arc<IntervalIndex>>,
    /// Calendar of every known event, indexed or not.
    event_calendar: HashMap<Uuid, Uuid>,
}

impl Snapshot {
    /// Validate and index a set of records.
    ///
    /// # Errors
    /// `InvalidSnapshot` for duplicate ids or events referencing an absent
    /// calendar; `InvalidRange` for events whose end is not after their start.
    pub fn new(
        config: EngineConfig,
        calendars: Vec<Calendar>,
        events: Vec<Event>,
        users: Vec<UserSettings>,
    ) -> Result<Self> {
        let mut calendar_map = HashMap::with_capacity(calendars.len());
        for calendar in calendars {
            let id = calendar.id;
            if calendar_map.insert(id, calendar).is_some() {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "duplicate calendar id {}",
                    id
                )));
            }
        }

        let mut user_map = HashMap::with_capacity(users.len());
        for settings in users {
            let id = settings.user_id;
            if user_map.insert(id, settings).is_some() {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "duplicate settings for user {}",
                    id
                )));
            }
        }

        let mut event_calendar = HashMap::with_capacity(events.len());
        let mut grouped: HashMap<Uuid, Vec<Event>> =
            calendar_map.keys().map(|id| (*id, Vec::new())).collect();
        for event in events {
            TimeRange::new(event.start, event.end).map_err(|_| {
                ScheduleError::InvalidRange(format!("event {} ends before it starts", event.id))
            })?;
            let Some(bucket) = grouped.get_mut(&event.calendar_id) else {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "event {} references unknown calendar {}",
                    event.id, event.calendar_id
                )));
            };
            if event_calendar.insert(event.id, event.calendar_id).is_some() {
                return Err(ScheduleError::InvalidSnapshot(format!(
                    "duplicate event id {}",
                    event.id
                )));
            }
            if config.tentative.participates(event.status) {
                bucket.push(event);
            }
        }

        let indexes = grouped
            .into_iter()
            .map(|(id, events)| (id, Arc::new(IntervalIndex::from_events(events))))
            .collect();

        tracing::debug!(
            calendars = calendar_map.len(),
            users = user_map.len(),
            events = event_calendar.len(),
            "snapshot built"
        );

        Ok(Self {
            config: Arc::new(config),
            calendars: calendar_map,
            users: user_map,
            indexes,
            event_calendar,
        })
    }

    /// Build from a deserialized document. A missing `config` uses defaults.
    pub fn from_data(data: SnapshotData) -> Result<Self> {
        Self::new(
            data.config.unwrap_or_default(),
            data.calendars,
            data.events,
            data.users,
        )
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: SnapshotData = serde_json::from_str(json)?;
        Self::from_data(data)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self, id: Uuid) -> Result<&Calendar> {
        self.calendars
            .get(&id)
            .ok_or_else(|| ScheduleError::calendar_not_found(id))
    }

    pub fn user(&self, id: Uuid) -> Result<&UserSettings> {
        self.users
            .get(&id)
            .ok_or_else(|| ScheduleError::user_not_found(id))
    }

    /// The index of participating events for a calendar.
    pub fn index(&self, calendar_id: Uuid) -> Result<&IntervalIndex> {
        self.indexes
            .get(&calendar_id)
            .map(|index| index.as_ref())
            .ok_or_else(|| ScheduleError::calendar_not_found(calendar_id))
    }

    pub fn calendars(&self) -> impl Iterator<Item = &Calendar> + '_ {
        self.calendars.values()
    }

    /// Participating events of `calendar_id` that intersect `[start, end)`,
    /// ordered by start.
    pub fn query_overlaps(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<&Event>> {
        let range = TimeRange::new(start, end)?;
        Ok(self.index(calendar_id)?.query_overlaps(&range).collect())
    }

    /// Calendar timezone, else the owner's, else the configured default.
    pub fn calendar_timezone(&self, calendar: &Calendar) -> Result<Tz> {
        if let Some(tz) = calendar.timezone.as_deref() {
            return parse_tz(tz);
        }
        match self.users.get(&calendar.user_id) {
            Some(owner) => self.user_timezone(owner),
            None => self.config.timezone(),
        }
    }

    /// User timezone, else the configured default.
    pub fn user_timezone(&self, settings: &UserSettings) -> Result<Tz> {
        match settings.timezone.as_deref() {
            Some(tz) => parse_tz(tz),
            None => self.config.timezone(),
        }
    }

    pub fn working_hours(&self, settings: &UserSettings) -> WorkingHours {
        settings.working_hours.unwrap_or(self.config.working_hours)
    }

    pub fn buffer(&self, settings: &UserSettings) -> BufferPolicy {
        BufferPolicy::new(settings.buffer_minutes.unwrap_or(self.config.buffer_minutes))
    }

    /// A new snapshot with `event` inserted, or replacing the event with the
    /// same id (possibly moving it between calendars).
    pub fn with_event(&self, event: Event) -> Result<Snapshot> {
        TimeRange::new(event.start, event.end)?;
        if !self.calendars.contains_key(&event.calendar_id) {
            return Err(ScheduleError::calendar_not_found(event.calendar_id));
        }

        let mut next = self.without_event(event.id);
        next.event_calendar.insert(event.id, event.calendar_id);
        if next.config.tentative.participates(event.status) {
            let index = next
                .indexes
                .entry(event.calendar_id)
                .or_insert_with(|| Arc::new(IntervalIndex::new()));
            Arc::make_mut(index).insert(event);
        }
        Ok(next)
    }

    /// A new snapshot without the event `id`. Unknown ids are a no-op.
    pub fn without_event(&self, id: Uuid) -> Snapshot {
        let mut next = self.clone();
        if let Some(calendar_id) = next.event_calendar.remove(&id) {
            if let Some(index) = next.indexes.get_mut(&calendar_id) {
                if index.get(id).is_some() {
                    Arc::make_mut(index).remove(id);
                }
            }
        }
        next
    }

    /// A new snapshot without calendar `id` and every event it owns.
    pub fn without_calendar(&self, id: Uuid) -> Result<Snapshot> {
        self.calendar(id)?;
        let mut next = self.clone();
        next.calendars.remove(&id);
        next.indexes.remove(&id);
        next.event_calendar.retain(|_, calendar_id| *calendar_id != id);
        Ok(next)
    }

    /// A new snapshot with `calendar` added or replaced. Existing events are kept.
    pub fn with_calendar(&self, calendar: Calendar) -> Snapshot {
        let mut next = self.clone();
        next.indexes
            .entry(calendar.id)
            .or_insert_with(|| Arc::new(IntervalIndex::new()));
        next.calendars.insert(calendar.id, calendar);
        next
    }
}
