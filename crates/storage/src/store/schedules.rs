#![forbid(unsafe_code)]

use super::*;
use cb_core::model::ScheduleSummary;
use rusqlite::{OptionalExtension, params};

const SUMMARY_QUERY: &str = r#"
    SELECT s.id, s.title, s.category, s.interval_days, s.assigned_to, s.is_both,
           s.created_by, s.created_at_ms,
           (SELECT t.date FROM tasks t
             WHERE t.schedule_id = s.id AND t.completed_at_ms IS NULL) AS next_due,
           (SELECT COUNT(*) FROM tasks t
             WHERE t.schedule_id = s.id AND t.completed_at_ms IS NOT NULL) AS completed_count
    FROM schedules s
"#;

impl SqliteStore {
    /// Creates the schedule and its first open occurrence in one transaction.
    /// A schedule with zero occurrences is not a valid state.
    pub fn create_schedule(
        &mut self,
        request: CreateScheduleRequest,
        today: Date,
    ) -> Result<(Schedule, TaskOccurrence), StoreError> {
        let CreateScheduleRequest {
            title,
            category,
            interval_days,
            assigned_to,
            is_both,
            created_by,
            start_date,
            created_at_ms,
        } = request;

        let title = validate_title(&title)?;
        let category = validate_category(&category)?;
        let interval_days = validate_interval_days(interval_days)?;
        let assignment = validate_assignment(assigned_to, is_both)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO schedules(title, category, interval_days, assigned_to, is_both,
                                  created_by, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                title,
                category,
                interval_days,
                assignment.assigned_to,
                assignment.is_both,
                created_by,
                created_at_ms
            ],
        )?;

        let schedule = Schedule {
            id: tx.last_insert_rowid(),
            title,
            category,
            interval_days,
            assignment,
            created_by,
            created_at_ms,
        };

        let occurrence =
            spawn_occurrence_tx(&tx, &schedule, start_date.unwrap_or(today), created_at_ms)?;

        tx.commit()?;
        Ok((schedule, occurrence))
    }

    /// Edits the definition and propagates title/category/assignment onto the
    /// open occurrence. Completed occurrences are history and stay untouched.
    pub fn update_schedule(
        &mut self,
        request: UpdateScheduleRequest,
    ) -> Result<Schedule, StoreError> {
        let UpdateScheduleRequest {
            id,
            title,
            category,
            interval_days,
            assignment,
        } = request;

        if title.is_none() && category.is_none() && interval_days.is_none() && assignment.is_none()
        {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }

        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
                params![id],
                schedule_from_row,
            )
            .optional()?;

        let Some(current) = current else {
            return Err(StoreError::UnknownSchedule);
        };

        let title = match title {
            Some(value) => validate_title(&value)?,
            None => current.title,
        };
        let category = match category {
            Some(value) => validate_category(&value)?,
            None => current.category,
        };
        let interval_days = match interval_days {
            Some(value) => validate_interval_days(value)?,
            None => current.interval_days,
        };
        let assignment = match assignment {
            Some(value) => validate_assignment(value.assigned_to, value.is_both)?,
            None => current.assignment,
        };

        tx.execute(
            r#"
            UPDATE schedules
            SET title = ?2, category = ?3, interval_days = ?4, assigned_to = ?5, is_both = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                title,
                category,
                interval_days,
                assignment.assigned_to,
                assignment.is_both
            ],
        )?;

        tx.execute(
            r#"
            UPDATE tasks
            SET title = ?2, category = ?3, assigned_to = ?4, is_both = ?5
            WHERE schedule_id = ?1 AND completed_at_ms IS NULL
            "#,
            params![
                id,
                title,
                category,
                assignment.assigned_to,
                assignment.is_both
            ],
        )?;

        tx.commit()?;
        Ok(Schedule {
            id,
            title,
            category,
            interval_days,
            assignment,
            created_by: current.created_by,
            created_at_ms: current.created_at_ms,
        })
    }

    /// Deleting a schedule keeps its history: completed occurrences are
    /// detached with the schedule's category snapshotted onto them, and only
    /// the open occurrence is removed.
    pub fn delete_schedule(&mut self, id: i64) -> Result<ScheduleRemoval, StoreError> {
        let tx = self.conn.transaction()?;
        let category = tx
            .query_row(
                "SELECT category FROM schedules WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(category) = category else {
            return Err(StoreError::UnknownSchedule);
        };

        let detached_completed = tx.execute(
            r#"
            UPDATE tasks
            SET schedule_id = NULL, category = ?2
            WHERE schedule_id = ?1 AND completed_at_ms IS NOT NULL
            "#,
            params![id, category],
        )?;

        let removed_open = tx.execute(
            "DELETE FROM tasks WHERE schedule_id = ?1 AND completed_at_ms IS NULL",
            params![id],
        )?;

        tx.execute("DELETE FROM schedules WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(ScheduleRemoval {
            detached_completed,
            removed_open,
        })
    }

    pub fn get_schedule(&self, id: i64) -> Result<ScheduleSummary, StoreError> {
        self.conn
            .query_row(
                &format!("{SUMMARY_QUERY} WHERE s.id = ?1"),
                params![id],
                summary_from_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownSchedule)
    }

    pub fn list_schedules(&self) -> Result<Vec<ScheduleSummary>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUMMARY_QUERY} ORDER BY s.category ASC, s.title ASC, s.id ASC"))?;
        let rows = stmt.query_map([], summary_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleSummary> {
    Ok(ScheduleSummary {
        schedule: schedule_from_row(row)?,
        next_due: opt_date_col(row, 8)?,
        completed_count: row.get(9)?,
    })
}
