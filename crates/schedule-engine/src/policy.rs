//! Which events occupy calendar time.

use serde::{Deserialize, Serialize};

use crate::model::EventStatus;

/// Treatment of `tentative` events in conflict checks and slot search.
///
/// `cancelled` events never participate and `confirmed` events always do;
/// only tentative events depend on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TentativePolicy {
    /// Tentative events hold their time like confirmed ones.
    #[default]
    Block,
    /// Tentative events are ignored like cancelled ones.
    Ignore,
}

impl TentativePolicy {
    pub fn participates(self, status: EventStatus) -> bool {
        match status {
            EventStatus::Confirmed => true,
            EventStatus::Tentative => self == TentativePolicy::Block,
            EventStatus::Cancelled => false,
        }
    }
}
