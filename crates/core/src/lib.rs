#![forbid(unsafe_code)]

pub mod dates;
pub mod due;
pub mod feed;
pub mod ghost;
pub mod model;
pub mod recurrence;
pub mod week;

pub use due::{DueState, DueStatus, due_state};
pub use model::{
    Assignment, AssignmentError, CompletedTaskRecord, DailyScheduleEntry, GhostOccurrence,
    IntervalCompletion, IntervalTask, IntervalTaskView, Schedule, ScheduleSummary, StatsRow,
    TaskItem, TaskOccurrence, User,
};
