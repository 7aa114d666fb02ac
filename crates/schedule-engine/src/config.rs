//! Engine-wide defaults.
//!
//! Loaded from the `config` object of a snapshot document, or from
//! `SCHEDULE_*` environment variables via [`EngineConfig::from_env`]. Every
//! field has a default, so `{}` is a valid configuration.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, ScheduleError};
use crate::model::{parse_time_of_day, WorkingHours};
use crate::policy::TentativePolicy;

pub const ENV_DEFAULT_TIMEZONE: &str = "SCHEDULE_DEFAULT_TIMEZONE";
pub const ENV_WORKING_HOURS_START: &str = "SCHEDULE_WORKING_HOURS_START";
pub const ENV_WORKING_HOURS_END: &str = "SCHEDULE_WORKING_HOURS_END";
pub const ENV_BUFFER_MINUTES: &str = "SCHEDULE_BUFFER_MINUTES";
pub const ENV_TENTATIVE: &str = "SCHEDULE_TENTATIVE";
pub const ENV_MAX_RANGE_DAYS: &str = "SCHEDULE_MAX_RANGE_DAYS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA timezone used when neither the calendar nor the user sets one.
    pub default_timezone: String,
    /// Working window for users without their own.
    pub working_hours: WorkingHours,
    /// Buffer for users without their own.
    pub buffer_minutes: u32,
    pub tentative: TentativePolicy,
    pub dst: DstPolicy,
    /// Longest date range a single slot search may cover.
    pub max_range_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            working_hours: WorkingHours::default(),
            buffer_minutes: 10,
            tentative: TentativePolicy::default(),
            dst: DstPolicy::default(),
            max_range_days: 366,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `SCHEDULE_*` variables present in the
    /// process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(tz) = lookup(ENV_DEFAULT_TIMEZONE) {
            parse_tz(&tz)?;
            config.default_timezone = tz;
        }

        let start = lookup(ENV_WORKING_HOURS_START)
            .map(|s| parse_time_of_day(&s))
            .transpose()?;
        let end = lookup(ENV_WORKING_HOURS_END)
            .map(|s| parse_time_of_day(&s))
            .transpose()?;
        if start.is_some() || end.is_some() {
            config.working_hours = WorkingHours::new(
                start.unwrap_or(config.working_hours.start),
                end.unwrap_or(config.working_hours.end),
            )?;
        }

        if let Some(raw) = lookup(ENV_BUFFER_MINUTES) {
            config.buffer_minutes = raw.trim().parse().map_err(|_| {
                ScheduleError::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_BUFFER_MINUTES, raw
                ))
            })?;
        }

        if let Some(raw) = lookup(ENV_TENTATIVE) {
            config.tentative = match raw.trim().to_ascii_lowercase().as_str() {
                "block" => TentativePolicy::Block,
                "ignore" => TentativePolicy::Ignore,
                other => {
                    return Err(ScheduleError::Config(format!(
                        "{} must be 'block' or 'ignore', got '{}'",
                        ENV_TENTATIVE, other
                    )))
                }
            };
        }

        if let Some(raw) = lookup(ENV_MAX_RANGE_DAYS) {
            config.max_range_days = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    ScheduleError::Config(format!(
                        "{} must be a positive integer, got '{}'",
                        ENV_MAX_RANGE_DAYS, raw
                    ))
                })?;
        }

        Ok(config)
    }

    /// The default timezone, parsed.
    pub fn timezone(&self) -> Result<Tz> {
        parse_tz(&self.default_timezone)
    }
}

/// Parse an IANA timezone name.
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}
