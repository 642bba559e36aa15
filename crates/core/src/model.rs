#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::dates::{serde_date, serde_date_option};
use crate::due::DueStatus;
use crate::recurrence;

/// Who a schedule or occurrence is assigned to. `is_both` means "the whole
/// household" and excludes a single assignee.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub assigned_to: Option<i64>,
    pub is_both: bool,
}

impl Assignment {
    pub fn try_new(assigned_to: Option<i64>, is_both: bool) -> Result<Self, AssignmentError> {
        if is_both && assigned_to.is_some() {
            return Err(AssignmentError::BothWithAssignee);
        }
        Ok(Self {
            assigned_to,
            is_both,
        })
    }

    pub fn unassigned() -> Self {
        Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignmentError {
    BothWithAssignee,
}

impl std::fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BothWithAssignee => {
                write!(f, "an assignment cannot name a user and both at once")
            }
        }
    }
}

impl std::error::Error for AssignmentError {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at_ms: i64,
}

/// A recurrence definition. Occurrences are generated from it one at a time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub interval_days: u32,
    #[serde(flatten)]
    pub assignment: Assignment,
    pub created_by: Option<i64>,
    pub created_at_ms: i64,
}

impl Schedule {
    /// The date one interval after `date`, saturating at the calendar limit.
    pub fn next_after(&self, date: Date) -> Date {
        date.checked_add(Duration::days(i64::from(self.interval_days)))
            .unwrap_or(Date::MAX)
    }
}

/// One dated instance of a schedule, or a standalone task.
///
/// `original_date` is set once at generation and never moves; `date` may be
/// pushed forward by postponement or housekeeping, never backward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskOccurrence {
    pub id: i64,
    pub schedule_id: Option<i64>,
    pub title: String,
    pub category: String,
    #[serde(with = "serde_date")]
    pub date: Date,
    #[serde(with = "serde_date")]
    pub original_date: Date,
    #[serde(flatten)]
    pub assignment: Assignment,
    pub completed_at_ms: Option<i64>,
    pub completed_by: Option<i64>,
    pub created_at_ms: i64,
}

impl TaskOccurrence {
    pub fn is_open(&self) -> bool {
        self.completed_at_ms.is_none()
    }

    pub fn is_postponed(&self) -> bool {
        self.date != self.original_date
    }
}

/// Non-persisted preview of the occurrence that will follow the open one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GhostOccurrence {
    pub schedule_id: i64,
    pub title: String,
    pub category: String,
    #[serde(with = "serde_date")]
    pub date: Date,
    #[serde(flatten)]
    pub assignment: Assignment,
}

/// What a dated-task listing is made of. Ghosts are a separate variant so no
/// caller can hand one to complete/postpone/delete by accident.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskItem {
    Occurrence(TaskOccurrence),
    Ghost(GhostOccurrence),
}

impl TaskItem {
    pub fn date(&self) -> Date {
        match self {
            TaskItem::Occurrence(occurrence) => occurrence.date,
            TaskItem::Ghost(ghost) => ghost.date,
        }
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self, TaskItem::Ghost(_))
    }
}

/// A recurring task without dated occurrences; its due state is derived from
/// the completion log at read time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalTask {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub interval_days: u32,
    pub created_by: Option<i64>,
    pub created_at_ms: i64,
}

/// An interval task enriched with its derived due state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntervalTaskView {
    #[serde(flatten)]
    pub task: IntervalTask,
    pub last_completed_at_ms: Option<i64>,
    #[serde(with = "serde_date")]
    pub due_date: Date,
    pub days_remaining: i64,
    pub status: DueStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalCompletion {
    pub id: i64,
    pub interval_task_id: i64,
    pub user_id: Option<i64>,
    pub completed_at_ms: i64,
}

/// A weekly/biweekly "who is where" entry; independent of the task system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyScheduleEntry {
    pub id: i64,
    pub user_id: i64,
    pub day_of_week: u8,
    pub label: String,
    pub interval_weeks: u32,
    #[serde(with = "serde_date_option")]
    pub reference_date: Option<Date>,
}

impl DailyScheduleEntry {
    pub fn applies_on(&self, date: Date) -> bool {
        recurrence::applies_on(date, self.day_of_week, self.interval_weeks, self.reference_date)
    }
}

/// Append-only completion fact, bucketed at write time by ISO week and year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTaskRecord {
    pub id: i64,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
    pub week: u8,
    pub year: i32,
    pub completed_at_ms: i64,
}

/// A schedule enriched for listing: the open occurrence's date and how many
/// occurrences were ever completed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleSummary {
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(with = "serde_date_option")]
    pub next_due: Option<Date>,
    pub completed_count: i64,
}

/// A history row joined for display. Joined fields are `None` when the task
/// or user has since been deleted; the row itself is never dropped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsRow {
    pub id: i64,
    pub task_id: Option<i64>,
    pub task_title: Option<String>,
    #[serde(with = "serde_date_option")]
    pub task_date: Option<Date>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub week: u8,
    pub year: i32,
    pub completed_at_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn occurrence() -> TaskOccurrence {
        TaskOccurrence {
            id: 7,
            schedule_id: Some(3),
            title: "Water the plants".to_string(),
            category: "Garden".to_string(),
            date: date!(2024 - 01 - 08),
            original_date: date!(2024 - 01 - 08),
            assignment: Assignment::unassigned(),
            completed_at_ms: None,
            completed_by: None,
            created_at_ms: 1_704_672_000_000,
        }
    }

    #[test]
    fn assignment_rejects_both_with_assignee() {
        assert_eq!(
            Assignment::try_new(Some(1), true).unwrap_err(),
            AssignmentError::BothWithAssignee
        );
        assert!(Assignment::try_new(Some(1), false).is_ok());
        assert!(Assignment::try_new(None, true).is_ok());
    }

    #[test]
    fn postponement_is_visible_once_dates_diverge() {
        let mut occurrence = occurrence();
        assert!(!occurrence.is_postponed());
        occurrence.date = date!(2024 - 01 - 10);
        assert!(occurrence.is_postponed());
        assert_eq!(occurrence.original_date, date!(2024 - 01 - 08));
    }

    #[test]
    fn occurrence_serializes_with_contract_field_names() {
        let value = serde_json::to_value(TaskItem::Occurrence(occurrence())).expect("json");
        assert_eq!(value["type"], "occurrence");
        assert_eq!(value["date"], "2024-01-08");
        assert_eq!(value["original_date"], "2024-01-08");
        assert_eq!(value["schedule_id"], 3);
        assert_eq!(value["is_both"], false);
        assert!(value["completed_at_ms"].is_null());
    }

    #[test]
    fn ghost_serializes_tagged() {
        let ghost = GhostOccurrence {
            schedule_id: 3,
            title: "Water the plants".to_string(),
            category: "Garden".to_string(),
            date: date!(2024 - 01 - 15),
            assignment: Assignment::unassigned(),
        };
        let value = serde_json::to_value(TaskItem::Ghost(ghost)).expect("json");
        assert_eq!(value["type"], "ghost");
        assert_eq!(value["date"], "2024-01-15");
    }

    #[test]
    fn schedule_next_after_adds_whole_days() {
        let schedule = Schedule {
            id: 1,
            title: "Vacuum".to_string(),
            category: String::new(),
            interval_days: 14,
            assignment: Assignment::unassigned(),
            created_by: None,
            created_at_ms: 0,
        };
        assert_eq!(schedule.next_after(date!(2024 - 02 - 26)), date!(2024 - 03 - 11));
    }

    #[test]
    fn daily_entry_delegates_to_the_matcher() {
        let entry = DailyScheduleEntry {
            id: 1,
            user_id: 2,
            day_of_week: 1,
            label: "Office".to_string(),
            interval_weeks: 2,
            reference_date: Some(date!(2024 - 01 - 01)),
        };
        assert!(entry.applies_on(date!(2024 - 01 - 15)));
        assert!(!entry.applies_on(date!(2024 - 01 - 08)));
        assert!(!entry.applies_on(date!(2024 - 01 - 02)));
    }
}
