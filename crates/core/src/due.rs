#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::dates::serde_date;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus {
    Overdue,
    Due,
    Upcoming,
}

impl DueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::Due => "due",
            DueStatus::Upcoming => "upcoming",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DueState {
    #[serde(with = "serde_date")]
    pub due_date: Date,
    pub days_remaining: i64,
    pub status: DueStatus,
}

/// Due state of an interval relative to a caller-supplied "today".
///
/// All three inputs are calendar dates; the interval is added to the date
/// components, never to an epoch timestamp, so a DST-shifted wall clock can
/// not move the boundary.
pub fn due_state(anchor: Date, interval_days: u32, today: Date) -> DueState {
    let due_date = anchor
        .checked_add(Duration::days(i64::from(interval_days)))
        .unwrap_or(Date::MAX);
    let days_remaining = (due_date - today).whole_days();
    let status = if days_remaining < 0 {
        DueStatus::Overdue
    } else if days_remaining == 0 {
        DueStatus::Due
    } else {
        DueStatus::Upcoming
    };
    DueState {
        due_date,
        days_remaining,
        status,
    }
}
