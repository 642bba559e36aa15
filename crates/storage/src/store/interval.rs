#![forbid(unsafe_code)]

use super::*;
use cb_core::due::due_state;
use cb_core::model::{IntervalCompletion, IntervalTask, IntervalTaskView};
use rusqlite::{OptionalExtension, Row, params};

const INTERVAL_COLUMNS: &str = "id, title, category, interval_days, created_by, created_at_ms";

const VIEW_QUERY: &str = r#"
    SELECT i.id, i.title, i.category, i.interval_days, i.created_by, i.created_at_ms,
           (SELECT MAX(c.completed_at_ms) FROM interval_completions c
             WHERE c.interval_task_id = i.id) AS last_completed_at_ms
    FROM interval_tasks i
"#;

impl SqliteStore {
    pub fn create_interval_task(
        &mut self,
        request: CreateIntervalTaskRequest,
    ) -> Result<IntervalTask, StoreError> {
        let CreateIntervalTaskRequest {
            title,
            category,
            interval_days,
            created_by,
            created_at_ms,
        } = request;

        let title = validate_title(&title)?;
        let category = validate_category(&category)?;
        let interval_days = validate_interval_days(interval_days)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO interval_tasks(title, category, interval_days, created_by, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![title, category, interval_days, created_by, created_at_ms],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(IntervalTask {
            id,
            title,
            category,
            interval_days,
            created_by,
            created_at_ms,
        })
    }

    pub fn update_interval_task(
        &mut self,
        request: UpdateIntervalTaskRequest,
    ) -> Result<IntervalTask, StoreError> {
        let UpdateIntervalTaskRequest {
            id,
            title,
            category,
            interval_days,
        } = request;

        if title.is_none() && category.is_none() && interval_days.is_none() {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }

        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                &format!("SELECT {INTERVAL_COLUMNS} FROM interval_tasks WHERE id = ?1"),
                params![id],
                interval_from_row,
            )
            .optional()?;

        let Some(current) = current else {
            return Err(StoreError::UnknownIntervalTask);
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

        tx.execute(
            "UPDATE interval_tasks SET title = ?2, category = ?3, interval_days = ?4 WHERE id = ?1",
            params![id, title, category, interval_days],
        )?;
        tx.commit()?;

        Ok(IntervalTask {
            id,
            title,
            category,
            interval_days,
            created_by: current.created_by,
            created_at_ms: current.created_at_ms,
        })
    }

    /// Removes the task and its completion log. The log never outlives its
    /// task; it only ever goes away here.
    pub fn delete_interval_task(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM interval_tasks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::UnknownIntervalTask);
        }
        tx.execute(
            "DELETE FROM interval_completions WHERE interval_task_id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_interval_task(
        &self,
        id: i64,
        today: Date,
    ) -> Result<IntervalTaskView, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("{VIEW_QUERY} WHERE i.id = ?1"),
                params![id],
                view_parts_from_row,
            )
            .optional()?;

        let Some((task, last_completed_at_ms)) = row else {
            return Err(StoreError::UnknownIntervalTask);
        };
        Ok(view_of(task, last_completed_at_ms, today))
    }

    /// All interval tasks with their derived due state, soonest due first.
    pub fn list_interval_tasks(&self, today: Date) -> Result<Vec<IntervalTaskView>, StoreError> {
        let mut stmt = self.conn.prepare(VIEW_QUERY)?;
        let rows = stmt.query_map([], view_parts_from_row)?;

        let mut views = Vec::new();
        for row in rows {
            let (task, last_completed_at_ms) = row?;
            views.push(view_of(task, last_completed_at_ms, today));
        }
        views.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.task.title.cmp(&b.task.title))
        });
        Ok(views)
    }

    /// Appends to the completion log. The task row itself never changes;
    /// the due state is always derived from the log at read time.
    pub fn complete_interval_task(
        &mut self,
        request: CompleteIntervalTaskRequest,
    ) -> Result<IntervalCompletion, StoreError> {
        let CompleteIntervalTaskRequest {
            id,
            user_id,
            completed_at_ms,
        } = request;

        let tx = self.conn.transaction()?;
        ensure_interval_task_tx(&tx, id)?;
        tx.execute(
            r#"
            INSERT INTO interval_completions(interval_task_id, user_id, completed_at_ms)
            VALUES (?1, ?2, ?3)
            "#,
            params![id, user_id, completed_at_ms],
        )?;
        let completion_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(IntervalCompletion {
            id: completion_id,
            interval_task_id: id,
            user_id,
            completed_at_ms,
        })
    }

    pub fn interval_task_history(
        &self,
        id: i64,
        limit: usize,
    ) -> Result<Vec<IntervalCompletion>, StoreError> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM interval_tasks WHERE id = ?1",
                params![id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::UnknownIntervalTask);
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, interval_task_id, user_id, completed_at_ms
            FROM interval_completions
            WHERE interval_task_id = ?1
            ORDER BY completed_at_ms DESC, id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![id, limit as i64], |row| {
            Ok(IntervalCompletion {
                id: row.get(0)?,
                interval_task_id: row.get(1)?,
                user_id: row.get(2)?,
                completed_at_ms: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn interval_task_categories(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT category FROM interval_tasks WHERE category <> '' ORDER BY category ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn interval_from_row(row: &Row<'_>) -> rusqlite::Result<IntervalTask> {
    Ok(IntervalTask {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        interval_days: row.get(3)?,
        created_by: row.get(4)?,
        created_at_ms: row.get(5)?,
    })
}

fn view_parts_from_row(row: &Row<'_>) -> rusqlite::Result<(IntervalTask, Option<i64>)> {
    Ok((interval_from_row(row)?, row.get(6)?))
}

fn view_of(task: IntervalTask, last_completed_at_ms: Option<i64>, today: Date) -> IntervalTaskView {
    let anchor = last_completed_at_ms
        .map(dates::date_of_ms)
        .unwrap_or_else(|| dates::date_of_ms(task.created_at_ms));
    let state = due_state(anchor, task.interval_days, today);
    IntervalTaskView {
        task,
        last_completed_at_ms,
        due_date: state.due_date,
        days_remaining: state.days_remaining,
        status: state.status,
    }
}

fn ensure_interval_task_tx(tx: &rusqlite::Transaction<'_>, id: i64) -> Result<(), StoreError> {
    let exists = tx
        .query_row(
            "SELECT 1 FROM interval_tasks WHERE id = ?1",
            params![id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some();
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownIntervalTask)
    }
}
