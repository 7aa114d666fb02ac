//! Tests for free-slot search.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use schedule_engine::buffer::expand;
use schedule_engine::conflict::check;
use schedule_engine::model::{
    Calendar, Event, EventStatus, Slot, TimeRange, UserSettings, WorkingHours,
};
use schedule_engine::slots::{
    find_first_slot, find_slots, find_slots_with, free_gaps, merge_busy_periods, DateRange,
    SlotQuery,
};
use schedule_engine::{EngineConfig, ScheduleError, Snapshot};
use uuid::Uuid;

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn cal() -> Uuid {
    Uuid::from_u128(0xC0)
}

fn user() -> Uuid {
    Uuid::from_u128(0xA0)
}

fn event(n: u128, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    Event::new(Uuid::from_u128(n), cal(), format!("event {}", n), start, end).unwrap()
}

fn snapshot_for(
    settings: UserSettings,
    calendar_tz: Option<&str>,
    events: Vec<Event>,
) -> Snapshot {
    Snapshot::new(
        EngineConfig::default(),
        vec![Calendar {
            id: cal(),
            user_id: settings.user_id,
            name: "work".to_string(),
            timezone: calendar_tz.map(str::to_string),
        }],
        events,
        vec![settings],
    )
    .unwrap()
}

fn snapshot(events: Vec<Event>) -> Snapshot {
    snapshot_for(UserSettings::new(user()), None, events)
}

fn slot(start: DateTime<Utc>, end: DateTime<Utc>) -> Slot {
    Slot {
        start,
        end,
        duration_minutes: (end - start).num_minutes(),
    }
}

fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

fn one_day(snap: &Snapshot, day: u32, duration: i64) -> Vec<Slot> {
    find_slots(snap, cal(), user(), DateRange::single(date(day)), duration)
        .unwrap()
        .collect()
}

// ── Single day ──────────────────────────────────────────────────────────────

#[test]
fn buffered_gaps_between_two_events() {
    // Events 09:00-10:00 and 14:00-15:30, hours 09:00-18:00, buffer 10,
    // duration 60 → [10:10,13:50) and [15:40,18:00).
    let snap = snapshot(vec![
        event(1, at(16, 9, 0), at(16, 10, 0)),
        event(2, at(16, 14, 0), at(16, 15, 30)),
    ]);

    let slots = one_day(&snap, 16, 60);

    assert_eq!(
        slots,
        vec![
            slot(at(16, 10, 10), at(16, 13, 50)),
            slot(at(16, 15, 40), at(16, 18, 0)),
        ]
    );
    assert_eq!(slots[0].duration_minutes, 220);
    assert_eq!(slots[1].duration_minutes, 140);

    let padded = [
        range(at(16, 8, 50), at(16, 10, 10)),
        range(at(16, 13, 50), at(16, 15, 40)),
    ];
    for s in &slots {
        for zone in &padded {
            assert!(!s.range().overlaps(zone), "{:?} overlaps {:?}", s, zone);
        }
    }
}

#[test]
fn empty_calendar_yields_whole_working_window() {
    let snap = snapshot(vec![]);
    assert_eq!(one_day(&snap, 16, 60), vec![slot(at(16, 9, 0), at(16, 18, 0))]);
}

#[test]
fn fully_booked_day_yields_no_slots() {
    let snap = snapshot(vec![event(1, at(16, 8, 0), at(16, 19, 0))]);
    assert!(one_day(&snap, 16, 15).is_empty());
}

#[test]
fn gaps_shorter_than_duration_are_dropped() {
    // Free gap 10:10-10:50 (40 min) is too short for 60.
    let snap = snapshot(vec![
        event(1, at(16, 9, 0), at(16, 10, 0)),
        event(2, at(16, 11, 0), at(16, 18, 0)),
    ]);

    assert!(one_day(&snap, 16, 60).is_empty());
    assert_eq!(one_day(&snap, 16, 40), vec![slot(at(16, 10, 10), at(16, 10, 50))]);
}

#[test]
fn event_before_window_pushes_buffer_into_it() {
    let snap = snapshot(vec![event(1, at(16, 8, 0), at(16, 9, 0))]);
    assert_eq!(one_day(&snap, 16, 60), vec![slot(at(16, 9, 10), at(16, 18, 0))]);
}

#[test]
fn overlapping_and_adjacent_busy_periods_merge() {
    let snap = snapshot(vec![
        event(1, at(16, 10, 0), at(16, 11, 0)),
        event(2, at(16, 10, 30), at(16, 12, 0)),
        event(3, at(16, 12, 20), at(16, 13, 0)), // padded start 12:10 touches 12:10
    ]);

    assert_eq!(
        one_day(&snap, 16, 30),
        vec![
            slot(at(16, 9, 0), at(16, 9, 50)),
            slot(at(16, 13, 10), at(16, 18, 0)),
        ]
    );
}

#[test]
fn cancelled_events_do_not_occupy_time() {
    let snap = snapshot(vec![
        event(1, at(16, 9, 0), at(16, 18, 0)).with_status(EventStatus::Cancelled)
    ]);
    assert_eq!(one_day(&snap, 16, 60), vec![slot(at(16, 9, 0), at(16, 18, 0))]);
}

#[test]
fn user_buffer_and_hours_override_defaults() {
    let mut settings = UserSettings::new(user());
    settings.buffer_minutes = Some(0);
    settings.working_hours = Some(WorkingHours::parse("08:00", "12:00").unwrap());
    let snap = snapshot_for(settings, None, vec![event(1, at(16, 9, 0), at(16, 10, 0))]);

    assert_eq!(
        one_day(&snap, 16, 60),
        vec![
            slot(at(16, 8, 0), at(16, 9, 0)),
            slot(at(16, 10, 0), at(16, 12, 0)),
        ]
    );
}

#[test]
fn window_is_computed_in_calendar_timezone() {
    // Bangkok is UTC+7 without DST: 09:00-18:00 local is 02:00-11:00Z.
    let snap = snapshot_for(UserSettings::new(user()), Some("Asia/Bangkok"), vec![]);
    assert_eq!(one_day(&snap, 16, 60), vec![slot(at(16, 2, 0), at(16, 11, 0))]);
}

// ── Date ranges ─────────────────────────────────────────────────────────────

#[test]
fn multi_day_range_is_chronological() {
    let snap = snapshot(vec![event(1, at(17, 12, 0), at(17, 13, 0))]);

    let range = DateRange::new(date(16), date(18)).unwrap();
    let slots: Vec<Slot> = find_slots(&snap, cal(), user(), range, 60).unwrap().collect();

    assert_eq!(
        slots,
        vec![
            slot(at(16, 9, 0), at(16, 18, 0)),
            slot(at(17, 9, 0), at(17, 11, 50)),
            slot(at(17, 13, 10), at(17, 18, 0)),
            slot(at(18, 9, 0), at(18, 18, 0)),
        ]
    );
    assert!(slots.windows(2).all(|w| w[0].start < w[1].start));
}

#[test]
fn weekends_can_be_excluded() {
    // 2026-03-20 is a Friday, 2026-03-23 a Monday.
    let snap = snapshot(vec![]);
    let query = SlotQuery::new(cal(), user(), DateRange::new(date(20), date(23)).unwrap(), 60)
        .exclude_weekends(true);

    let days: Vec<u32> = find_slots_with(&snap, &query)
        .unwrap()
        .map(|s| chrono::Datelike::day(&s.start))
        .collect();

    assert_eq!(days, vec![20, 23]);
}

#[test]
fn search_is_restartable() {
    let snap = snapshot(vec![
        event(1, at(16, 9, 0), at(16, 10, 0)),
        event(2, at(17, 14, 0), at(17, 15, 30)),
    ]);
    let range = DateRange::new(date(16), date(20)).unwrap();

    let first: Vec<Slot> = find_slots(&snap, cal(), user(), range, 30).unwrap().collect();
    let second: Vec<Slot> = find_slots(&snap, cal(), user(), range, 30).unwrap().collect();

    assert_eq!(first, second);
}

#[test]
fn returned_slots_never_conflict() {
    let snap = snapshot(vec![
        event(1, at(16, 9, 0), at(16, 10, 0)),
        event(2, at(16, 14, 0), at(16, 15, 30)),
        event(3, at(17, 11, 0), at(17, 17, 0)),
    ]);

    let range = DateRange::new(date(16), date(17)).unwrap();
    for s in find_slots(&snap, cal(), user(), range, 60).unwrap() {
        assert!(check(&snap, cal(), s.start, s.end, None).unwrap().is_empty());
    }
}

#[test]
fn first_slot_stops_at_earliest() {
    let snap = snapshot(vec![event(1, at(16, 8, 0), at(16, 19, 0))]);
    let range = DateRange::new(date(16), date(18)).unwrap();

    let first = find_first_slot(&snap, cal(), user(), range, 60).unwrap();

    assert_eq!(first, Some(slot(at(17, 9, 0), at(17, 18, 0))));
}

#[test]
fn no_availability_is_empty_not_error() {
    let snap = snapshot(vec![event(1, at(16, 0, 0), at(19, 0, 0))]);
    let range = DateRange::new(date(16), date(18)).unwrap();

    assert_eq!(find_first_slot(&snap, cal(), user(), range, 60).unwrap(), None);
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn non_positive_duration_is_invalid() {
    let snap = snapshot(vec![]);
    let err = find_slots(&snap, cal(), user(), DateRange::single(date(16)), 0).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRange(_)));
}

#[test]
fn backwards_date_range_is_invalid() {
    let err = DateRange::new(date(18), date(16)).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRange(_)));
}

#[test]
fn range_beyond_limit_is_invalid() {
    let snap = Snapshot::new(
        EngineConfig {
            max_range_days: 7,
            ..EngineConfig::default()
        },
        vec![Calendar {
            id: cal(),
            user_id: user(),
            name: "work".to_string(),
            timezone: None,
        }],
        vec![],
        vec![UserSettings::new(user())],
    )
    .unwrap();

    let week = DateRange::new(date(1), date(7)).unwrap();
    assert!(find_slots(&snap, cal(), user(), week, 60).is_ok());

    let eight_days = DateRange::new(date(1), date(8)).unwrap();
    let err = find_slots(&snap, cal(), user(), eight_days, 60).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidRange(_)));
}

#[test]
fn unknown_calendar_or_user_is_not_found() {
    let snap = snapshot(vec![]);
    let day = DateRange::single(date(16));

    let err = find_slots(&snap, Uuid::from_u128(1), user(), day, 60).unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { kind: "calendar", .. }));

    let err = find_slots(&snap, cal(), Uuid::from_u128(1), day, 60).unwrap_err();
    assert!(matches!(err, ScheduleError::NotFound { kind: "user", .. }));
}

// ── Extreme inputs ──────────────────────────────────────────────────────────

#[test]
fn huge_duration_yields_no_slots() {
    let snap = snapshot(vec![]);

    let found: Vec<Slot> =
        find_slots(&snap, cal(), user(), DateRange::single(date(16)), i64::MAX / 2)
            .unwrap()
            .collect();

    assert!(found.is_empty());
}

#[test]
fn buffer_saturates_at_last_representable_instant() {
    let last_day = NaiveDate::MAX;
    let start = last_day.and_hms_opt(17, 0, 0).unwrap().and_utc();
    let end = last_day.and_hms_opt(23, 55, 0).unwrap().and_utc();

    let padded = expand(range(start, end), 10);
    assert_eq!(padded.start, last_day.and_hms_opt(16, 50, 0).unwrap().and_utc());
    assert_eq!(padded.end, DateTime::<Utc>::MAX_UTC);

    let snap = snapshot(vec![event(1, start, end)]);
    let found: Vec<Slot> = find_slots(&snap, cal(), user(), DateRange::single(last_day), 60)
        .unwrap()
        .collect();

    assert_eq!(
        found,
        vec![slot(last_day.and_hms_opt(9, 0, 0).unwrap().and_utc(), padded.start)]
    );
}

// ── Sweep primitives ────────────────────────────────────────────────────────

#[test]
fn merge_clips_to_window_and_coalesces() {
    let window = range(at(16, 9, 0), at(16, 18, 0));
    let busy = merge_busy_periods(
        &[
            range(at(16, 13, 0), at(16, 14, 0)),
            range(at(16, 8, 0), at(16, 10, 0)),
            range(at(16, 14, 0), at(16, 15, 0)),
            range(at(16, 17, 30), at(16, 20, 0)),
            range(at(16, 6, 0), at(16, 7, 0)),
        ],
        &window,
    );

    assert_eq!(
        busy,
        vec![
            range(at(16, 9, 0), at(16, 10, 0)),
            range(at(16, 13, 0), at(16, 15, 0)),
            range(at(16, 17, 30), at(16, 18, 0)),
        ]
    );
}

#[test]
fn free_gaps_cover_window_complement() {
    let window = range(at(16, 9, 0), at(16, 18, 0));
    let busy = vec![
        range(at(16, 9, 0), at(16, 10, 0)),
        range(at(16, 13, 0), at(16, 15, 0)),
    ];

    assert_eq!(
        free_gaps(&busy, &window),
        vec![
            slot(at(16, 10, 0), at(16, 13, 0)),
            slot(at(16, 15, 0), at(16, 18, 0)),
        ]
    );
}
