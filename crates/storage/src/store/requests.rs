#![forbid(unsafe_code)]

use cb_core::Assignment;
use time::Date;

#[derive(Clone, Debug, PartialEq)]
pub struct CreateScheduleRequest {
    pub title: String,
    pub category: String,
    pub interval_days: u32,
    pub assigned_to: Option<i64>,
    pub is_both: bool,
    pub created_by: Option<i64>,
    /// First occurrence date; defaults to the caller's `today`.
    pub start_date: Option<Date>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateScheduleRequest {
    pub id: i64,
    pub title: Option<String>,
    pub category: Option<String>,
    pub interval_days: Option<u32>,
    pub assignment: Option<Assignment>,
}

/// What `delete_schedule` did: completed occurrences detached into history
/// versus open occurrences removed outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleRemoval {
    pub detached_completed: usize,
    pub removed_open: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTaskRequest {
    pub title: String,
    pub category: String,
    pub date: Date,
    pub assigned_to: Option<i64>,
    pub is_both: bool,
    pub created_at_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompleteTaskRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub completed_at_ms: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostponeTaskRequest {
    pub id: i64,
    /// Defaults to one day past the current date.
    pub new_date: Option<Date>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassignTaskRequest {
    pub id: i64,
    pub assigned_to: Option<i64>,
    pub is_both: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateIntervalTaskRequest {
    pub title: String,
    pub category: String,
    pub interval_days: u32,
    pub created_by: Option<i64>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateIntervalTaskRequest {
    pub id: i64,
    pub title: Option<String>,
    pub category: Option<String>,
    pub interval_days: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompleteIntervalTaskRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub completed_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateDailyEntryRequest {
    pub user_id: i64,
    pub day_of_week: u8,
    pub label: String,
    pub interval_weeks: u32,
    pub reference_date: Option<Date>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateDailyEntryRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub day_of_week: Option<u8>,
    pub label: Option<String>,
    pub interval_weeks: Option<u32>,
    /// `Some(None)` clears the reference date.
    pub reference_date: Option<Option<Date>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsPeriod {
    Week,
    Month,
    Year,
    All,
}
