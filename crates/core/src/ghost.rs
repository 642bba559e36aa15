#![forbid(unsafe_code)]

use crate::model::{GhostOccurrence, Schedule, TaskOccurrence};

/// Preview of the occurrence that will follow `open` once it is completed.
///
/// Read-only: nothing is persisted, and the result carries the schedule's
/// current title/category/assignment, not the open occurrence's. Returns
/// `None` when the occurrence is already completed or belongs to a different
/// schedule.
pub fn project_next(schedule: &Schedule, open: &TaskOccurrence) -> Option<GhostOccurrence> {
    if !open.is_open() || open.schedule_id != Some(schedule.id) {
        return None;
    }
    Some(GhostOccurrence {
        schedule_id: schedule.id,
        title: schedule.title.clone(),
        category: schedule.category.clone(),
        date: schedule.next_after(open.date),
        assignment: schedule.assignment,
    })
}
