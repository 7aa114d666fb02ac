//! # schedule-engine
//!
//! Conflict detection, working-hours validation and free-slot search for a
//! personal scheduling backend.
//!
//! Every query is a pure function of an immutable [`Snapshot`] supplied by the
//! caller. The engine never performs I/O and holds no state between calls;
//! loading events and settings is the persistence layer's job.
//!
//! ## Modules
//!
//! - [`snapshot`] — Immutable calendars, settings and per-calendar indexes
//! - [`interval`] — Ordered interval index with pruned overlap queries
//! - [`conflict`] — Strict overlap checks (`check`, `find_conflicts`)
//! - [`hours`] — Working-hours validation in the resolved timezone
//! - [`slots`] — Lazy free-slot search across a date range
//! - [`buffer`] — Padding around occupied intervals for slot search
//! - [`policy`] — Which event statuses occupy time
//! - [`dst`] — DST gap handling for working-hours boundaries
//! - [`config`] — Engine defaults and environment loading
//! - [`model`] — Events, calendars, settings, ranges and slots
//! - [`error`] — Error types

pub mod buffer;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod hours;
pub mod interval;
pub mod model;
pub mod policy;
pub mod slots;
pub mod snapshot;

pub use buffer::BufferPolicy;
pub use config::EngineConfig;
pub use conflict::{check, find_conflicts, Conflict};
pub use error::{Result, ScheduleError};
pub use hours::{is_within, is_within_calendar};
pub use interval::IntervalIndex;
pub use model::{Calendar, Event, EventStatus, Slot, TimeRange, UserSettings, WorkingHours};
pub use policy::TentativePolicy;
pub use slots::{find_first_slot, find_slots, find_slots_with, DateRange, SlotQuery};
pub use snapshot::{Snapshot, SnapshotData};
