//! `sched` CLI — run conflict, working-hours and free-slot queries against a
//! JSON calendar snapshot.
//!
//! ## Usage
//!
//! ```sh
//! # Which events overlap a proposed meeting? (snapshot on stdin)
//! cat snapshot.json | sched check --calendar $CAL --start 2026-03-16T09:30:00Z --end 2026-03-16T10:30:00Z
//!
//! # Same check while moving an existing event
//! sched check -s snapshot.json --calendar $CAL --start ... --end ... --exclude $EVENT
//!
//! # Is an interval inside the user's working hours?
//! sched within -s snapshot.json --user $USER --start 2026-03-16T19:00:00Z --end 2026-03-16T20:00:00Z
//!
//! # Free 60-minute slots over a week, weekdays only, first five
//! sched slots -s snapshot.json --calendar $CAL --user $USER \
//!   --from 2026-03-16 --to 2026-03-22 --duration 60 --exclude-weekends --limit 5
//! ```
//!
//! Set `RUST_LOG=schedule_engine=debug` (or pass `-v`) to trace query
//! internals on stderr.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use schedule_engine::{
    conflict, hours, slots, DateRange, EngineConfig, SlotQuery, Snapshot, SnapshotData,
};
use serde::Serialize;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "sched",
    version,
    about = "Conflict, working-hours and free-slot queries over a calendar snapshot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot JSON file (reads from stdin if omitted)
    #[arg(short, long, global = true)]
    snapshot: Option<String>,

    /// Log query details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List events conflicting with a proposed interval
    Check {
        #[arg(long)]
        calendar: Uuid,
        /// RFC 3339 instant (naive times are read as UTC)
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_instant)]
        end: DateTime<Utc>,
        /// Event to ignore, e.g. the one being rescheduled
        #[arg(long)]
        exclude: Option<Uuid>,
    },
    /// List occupying events intersecting an interval
    Overlaps {
        #[arg(long)]
        calendar: Uuid,
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_instant)]
        end: DateTime<Utc>,
    },
    /// Check an interval against a user's working hours
    Within {
        #[arg(long)]
        user: Uuid,
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_instant)]
        end: DateTime<Utc>,
    },
    /// Find free slots across a date range
    Slots {
        #[arg(long)]
        calendar: Uuid,
        #[arg(long)]
        user: Uuid,
        /// First local date (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last local date, inclusive (defaults to --from)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Minimum slot length in minutes (defaults to the user's default duration)
        #[arg(long)]
        duration: Option<i64>,
        /// Skip Saturdays and Sundays
        #[arg(long)]
        exclude_weekends: bool,
        /// Stop after this many slots
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct CheckOutput {
    conflicts: Vec<conflict::Conflict>,
}

#[derive(Serialize)]
struct WithinOutput {
    within: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let snapshot = load_snapshot(cli.snapshot.as_deref())?;

    let output = match cli.command {
        Commands::Check {
            calendar,
            start,
            end,
            exclude,
        } => {
            let conflicts = conflict::find_conflicts(&snapshot, calendar, start, end, exclude)
                .context("Conflict check failed")?;
            serde_json::to_string_pretty(&CheckOutput { conflicts })?
        }
        Commands::Overlaps {
            calendar,
            start,
            end,
        } => {
            let events = snapshot
                .query_overlaps(calendar, start, end)
                .context("Overlap query failed")?;
            serde_json::to_string_pretty(&events)?
        }
        Commands::Within { user, start, end } => {
            let within = hours::is_within(&snapshot, user, start, end)
                .context("Working-hours check failed")?;
            serde_json::to_string_pretty(&WithinOutput { within })?
        }
        Commands::Slots {
            calendar,
            user,
            from,
            to,
            duration,
            exclude_weekends,
            limit,
        } => {
            let range = DateRange::new(from, to.unwrap_or(from))?;
            let duration = match duration {
                Some(minutes) => minutes,
                None => i64::from(
                    snapshot
                        .user(user)
                        .context("Cannot pick a default duration")?
                        .default_duration_minutes,
                ),
            };
            let query = SlotQuery::new(calendar, user, range, duration)
                .exclude_weekends(exclude_weekends);
            let found = slots::find_slots_with(&snapshot, &query)
                .context("Free-slot search failed")?
                .take(limit.unwrap_or(usize::MAX))
                .collect::<Vec<_>>();
            serde_json::to_string_pretty(&found)?
        }
    };

    println!("{}", output);
    Ok(())
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Parse the snapshot document. Without an embedded `config` object the
/// engine configuration comes from `SCHEDULE_*` environment variables.
fn load_snapshot(path: Option<&str>) -> Result<Snapshot> {
    let json = read_input(path)?;
    let mut data: SnapshotData =
        serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;
    if data.config.is_none() {
        data.config =
            Some(EngineConfig::from_env().context("Invalid SCHEDULE_* environment configuration")?);
    }
    let snapshot = Snapshot::from_data(data).context("Invalid snapshot")?;
    tracing::debug!(source = path.unwrap_or("<stdin>"), "snapshot loaded");
    Ok(snapshot)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read snapshot from stdin")?;
            Ok(buf)
        }
    }
}

/// Accept RFC 3339 (`2026-03-16T09:00:00+07:00`) or a naive
/// `2026-03-16T09:00:00`, which is read as UTC.
fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}
