//! Error types for schedule-engine operations.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// `end <= start`, a date range running backwards, or a validity check
    /// that spans more than one local calendar day.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A calendar or user-settings record referenced by the caller is absent
    /// from the snapshot.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScheduleError {
    pub(crate) fn calendar_not_found(id: Uuid) -> Self {
        ScheduleError::NotFound {
            kind: "calendar",
            id,
        }
    }

    pub(crate) fn user_not_found(id: Uuid) -> Self {
        ScheduleError::NotFound { kind: "user", id }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
