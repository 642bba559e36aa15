#![forbid(unsafe_code)]

use super::*;
use cb_core::ghost;
use cb_core::model::TaskItem;
use cb_core::week;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Creates a standalone occurrence (no schedule behind it).
    pub fn create_task(&mut self, request: CreateTaskRequest) -> Result<TaskOccurrence, StoreError> {
        let CreateTaskRequest {
            title,
            category,
            date,
            assigned_to,
            is_both,
            created_at_ms,
        } = request;

        let title = validate_title(&title)?;
        let category = validate_category(&category)?;
        let assignment = validate_assignment(assigned_to, is_both)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO tasks(schedule_id, title, category, date, original_date,
                              assigned_to, is_both, completed_at_ms, completed_by, created_at_ms)
            VALUES (NULL, ?1, ?2, ?3, ?3, ?4, ?5, NULL, NULL, ?6)
            "#,
            params![
                title,
                category,
                dates::format_date(date),
                assignment.assigned_to,
                assignment.is_both,
                created_at_ms
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(TaskOccurrence {
            id,
            schedule_id: None,
            title,
            category,
            date,
            original_date: date,
            assignment,
            completed_at_ms: None,
            completed_by: None,
            created_at_ms,
        })
    }

    pub fn get_task(&self, id: i64) -> Result<TaskOccurrence, StoreError> {
        self.conn
            .query_row(
                &format!("SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                occurrence_from_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownTask)
    }

    /// Occurrences dated inside `from..=to`, plus a ghost preview for every
    /// schedule whose projected next occurrence also lands in the range.
    pub fn list_tasks(&self, from: Date, to: Date) -> Result<Vec<TaskItem>, StoreError> {
        if from > to {
            return Err(StoreError::InvalidInput("from must not be after to"));
        }

        let mut items = Vec::new();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE date >= ?1 AND date <= ?2 \
             ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt.query_map(
            params![dates::format_date(from), dates::format_date(to)],
            occurrence_from_row,
        )?;
        for row in rows {
            items.push(TaskItem::Occurrence(row?));
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.title, s.category, s.interval_days, s.assigned_to, s.is_both,
                   s.created_by, s.created_at_ms,
                   t.id, t.schedule_id, t.title, t.category, t.date, t.original_date,
                   t.assigned_to, t.is_both, t.completed_at_ms, t.completed_by, t.created_at_ms
            FROM schedules s
            JOIN tasks t ON t.schedule_id = s.id AND t.completed_at_ms IS NULL
            "#,
        )?;
        let pairs = stmt.query_map([], |row| {
            let schedule = schedule_from_row(row)?;
            let occurrence = TaskOccurrence {
                id: row.get(8)?,
                schedule_id: row.get(9)?,
                title: row.get(10)?,
                category: row.get(11)?,
                date: date_col(row, 12)?,
                original_date: date_col(row, 13)?,
                assignment: Assignment {
                    assigned_to: row.get(14)?,
                    is_both: row.get(15)?,
                },
                completed_at_ms: row.get(16)?,
                completed_by: row.get(17)?,
                created_at_ms: row.get(18)?,
            };
            Ok((schedule, occurrence))
        })?;
        for pair in pairs {
            let (schedule, occurrence) = pair?;
            if let Some(ghost) = ghost::project_next(&schedule, &occurrence)
                && ghost.date >= from
                && ghost.date <= to
            {
                items.push(TaskItem::Ghost(ghost));
            }
        }

        items.sort_by(|a, b| {
            a.date()
                .cmp(&b.date())
                .then_with(|| a.is_ghost().cmp(&b.is_ghost()))
        });
        Ok(items)
    }

    /// Completes an occurrence, records the history fact, and for
    /// schedule-linked occurrences spawns the next one — all in one
    /// transaction. Returns the completed occurrence and the spawned
    /// successor, if any.
    pub fn complete_task(
        &mut self,
        request: CompleteTaskRequest,
    ) -> Result<(TaskOccurrence, Option<TaskOccurrence>), StoreError> {
        let CompleteTaskRequest {
            id,
            user_id,
            completed_at_ms,
        } = request;

        let tx = self.conn.transaction()?;
        let row = tx
            .query_row(
                &format!("SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                occurrence_from_row,
            )
            .optional()?;

        let Some(mut occurrence) = row else {
            return Err(StoreError::UnknownTask);
        };
        if occurrence.completed_at_ms.is_some() {
            return Err(StoreError::AlreadyCompleted);
        }

        tx.execute(
            "UPDATE tasks SET completed_at_ms = ?2, completed_by = ?3 WHERE id = ?1",
            params![id, completed_at_ms, user_id],
        )?;
        occurrence.completed_at_ms = Some(completed_at_ms);
        occurrence.completed_by = user_id;

        let bucket = week::bucket_of(dates::date_of_ms(completed_at_ms));
        tx.execute(
            r#"
            INSERT INTO completed_tasks(task_id, user_id, week, year, completed_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![id, user_id, bucket.week, bucket.year, completed_at_ms],
        )?;

        let next = match occurrence.schedule_id {
            Some(schedule_id) => {
                let schedule = tx
                    .query_row(
                        &format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?1"),
                        params![schedule_id],
                        schedule_from_row,
                    )
                    .optional()?;
                match schedule {
                    Some(schedule) => {
                        let from = schedule.next_after(occurrence.date);
                        Some(spawn_occurrence_tx(&tx, &schedule, from, completed_at_ms)?)
                    }
                    None => {
                        tracing::error!(
                            task_id = id,
                            schedule_id,
                            "completed occurrence references a missing schedule"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        tx.commit()?;
        Ok((occurrence, next))
    }

    /// Reverses a completion. If generation already produced the successor,
    /// the successor is deleted so the schedule is back to exactly one open
    /// occurrence; the matching history record is removed as well.
    pub fn uncomplete_task(&mut self, id: i64) -> Result<TaskOccurrence, StoreError> {
        let tx = self.conn.transaction()?;
        let row = tx
            .query_row(
                &format!("SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                occurrence_from_row,
            )
            .optional()?;

        let Some(mut occurrence) = row else {
            return Err(StoreError::UnknownTask);
        };
        let Some(completed_at_ms) = occurrence.completed_at_ms else {
            return Err(StoreError::NotCompleted);
        };

        if let Some(schedule_id) = occurrence.schedule_id {
            let removed = tx.execute(
                "DELETE FROM tasks WHERE schedule_id = ?1 AND completed_at_ms IS NULL",
                params![schedule_id],
            )?;
            if removed > 0 {
                tracing::debug!(schedule_id, removed, "removed generated successor on uncomplete");
            }
        }

        tx.execute(
            "DELETE FROM completed_tasks WHERE task_id = ?1 AND completed_at_ms = ?2",
            params![id, completed_at_ms],
        )?;
        tx.execute(
            "UPDATE tasks SET completed_at_ms = NULL, completed_by = NULL WHERE id = ?1",
            params![id],
        )?;

        tx.commit()?;
        occurrence.completed_at_ms = None;
        occurrence.completed_by = None;
        Ok(occurrence)
    }

    /// Moves an open occurrence's date forward (default: one day). The
    /// original date is kept so the drift stays visible.
    pub fn postpone_task(
        &mut self,
        request: PostponeTaskRequest,
    ) -> Result<TaskOccurrence, StoreError> {
        let PostponeTaskRequest { id, new_date } = request;

        let tx = self.conn.transaction()?;
        let row = tx
            .query_row(
                &format!("SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                occurrence_from_row,
            )
            .optional()?;

        let Some(mut occurrence) = row else {
            return Err(StoreError::UnknownTask);
        };
        if occurrence.completed_at_ms.is_some() {
            return Err(StoreError::AlreadyCompleted);
        }

        let new_date =
            new_date.unwrap_or_else(|| occurrence.date.next_day().unwrap_or(occurrence.date));
        if new_date < occurrence.date {
            return Err(StoreError::InvalidInput("date can only move forward"));
        }

        tx.execute(
            "UPDATE tasks SET date = ?2 WHERE id = ?1",
            params![id, dates::format_date(new_date)],
        )?;
        tx.commit()?;

        occurrence.date = new_date;
        Ok(occurrence)
    }

    pub fn reassign_task(
        &mut self,
        request: ReassignTaskRequest,
    ) -> Result<TaskOccurrence, StoreError> {
        let ReassignTaskRequest {
            id,
            assigned_to,
            is_both,
        } = request;

        let assignment = validate_assignment(assigned_to, is_both)?;

        let tx = self.conn.transaction()?;
        let row = tx
            .query_row(
                &format!("SELECT {OCCURRENCE_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                occurrence_from_row,
            )
            .optional()?;

        let Some(mut occurrence) = row else {
            return Err(StoreError::UnknownTask);
        };
        if occurrence.completed_at_ms.is_some() {
            return Err(StoreError::AlreadyCompleted);
        }

        tx.execute(
            "UPDATE tasks SET assigned_to = ?2, is_both = ?3 WHERE id = ?1",
            params![id, assignment.assigned_to, assignment.is_both],
        )?;
        tx.commit()?;

        occurrence.assignment = assignment;
        Ok(occurrence)
    }

    /// Removes a standalone occurrence. Schedule-linked occurrences are only
    /// ever removed through schedule deletion, which keeps the one-open
    /// invariant intact.
    pub fn delete_task(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let schedule_id = tx
            .query_row(
                "SELECT schedule_id FROM tasks WHERE id = ?1",
                params![id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?;

        let Some(schedule_id) = schedule_id else {
            return Err(StoreError::UnknownTask);
        };
        if schedule_id.is_some() {
            return Err(StoreError::ScheduleLinked);
        }

        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    /// Advances every schedule-linked open occurrence whose date has slipped
    /// into the past up to `today`, keeping `original_date` for overdue
    /// display. Safe to run on every read of the current view: a second pass
    /// with the same `today` advances nothing.
    pub fn run_housekeeping(&mut self, today: Date) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let advanced = tx.execute(
            r#"
            UPDATE tasks
            SET date = ?1
            WHERE completed_at_ms IS NULL AND schedule_id IS NOT NULL AND date < ?1
            "#,
            params![dates::format_date(today)],
        )?;
        tx.commit()?;

        if advanced > 0 {
            tracing::debug!(advanced, "housekeeping advanced overdue occurrences");
        }
        Ok(advanced)
    }
}
