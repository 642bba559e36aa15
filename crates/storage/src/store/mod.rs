#![forbid(unsafe_code)]

mod daily;
mod error;
mod history;
mod interval;
mod occurrences;
mod requests;
mod schedules;
mod users;

pub use error::StoreError;
pub use requests::*;

use cb_core::dates;
use cb_core::model::{Assignment, Schedule, TaskOccurrence};
use rusqlite::{Connection, Row, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::Date;

const DB_FILE: &str = "choreboard.db";
const MAX_TEXT_LEN: usize = 256;
const MAX_INTERVAL_DAYS: u32 = 3650;
const MAX_INTERVAL_WEEKS: u32 = 52;

pub(crate) const SCHEDULE_COLUMNS: &str =
    "id, title, category, interval_days, assigned_to, is_both, created_by, created_at_ms";
pub(crate) const OCCURRENCE_COLUMNS: &str = "id, schedule_id, title, category, date, \
     original_date, assigned_to, is_both, completed_at_ms, completed_by, created_at_ms";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedules (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          title TEXT NOT NULL,
          category TEXT NOT NULL DEFAULT '',
          interval_days INTEGER NOT NULL,
          assigned_to INTEGER,
          is_both INTEGER NOT NULL DEFAULT 0,
          created_by INTEGER,
          created_at_ms INTEGER NOT NULL,
          CHECK(interval_days >= 1),
          CHECK(is_both = 0 OR assigned_to IS NULL)
        );

        CREATE TABLE IF NOT EXISTS tasks (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          schedule_id INTEGER,
          title TEXT NOT NULL,
          category TEXT NOT NULL DEFAULT '',
          date TEXT NOT NULL,
          original_date TEXT NOT NULL,
          assigned_to INTEGER,
          is_both INTEGER NOT NULL DEFAULT 0,
          completed_at_ms INTEGER,
          completed_by INTEGER,
          created_at_ms INTEGER NOT NULL,
          CHECK(is_both = 0 OR assigned_to IS NULL)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_schedule_open
          ON tasks(schedule_id, completed_at_ms);
        CREATE INDEX IF NOT EXISTS idx_tasks_date ON tasks(date);

        CREATE TABLE IF NOT EXISTS interval_tasks (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          title TEXT NOT NULL,
          category TEXT NOT NULL DEFAULT '',
          interval_days INTEGER NOT NULL,
          created_by INTEGER,
          created_at_ms INTEGER NOT NULL,
          CHECK(interval_days >= 1)
        );

        CREATE TABLE IF NOT EXISTS interval_completions (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          interval_task_id INTEGER NOT NULL,
          user_id INTEGER,
          completed_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_interval_completions_task
          ON interval_completions(interval_task_id, completed_at_ms);

        CREATE TABLE IF NOT EXISTS completed_tasks (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          task_id INTEGER,
          user_id INTEGER,
          week INTEGER NOT NULL,
          year INTEGER NOT NULL,
          completed_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_completed_tasks_bucket
          ON completed_tasks(year, week);

        CREATE TABLE IF NOT EXISTS daily_entries (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          user_id INTEGER NOT NULL,
          day_of_week INTEGER NOT NULL,
          label TEXT NOT NULL,
          interval_weeks INTEGER NOT NULL DEFAULT 1,
          reference_date TEXT,
          CHECK(day_of_week BETWEEN 0 AND 6),
          CHECK(interval_weeks >= 1)
        );
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", "v1"],
    )?;
    Ok(())
}

pub fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

// --- shared row mapping ---

fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Date> {
    let raw: String = row.get(idx)?;
    dates::parse_date(&raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

fn opt_date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Date>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        dates::parse_date(&value).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
    })
    .transpose()
}

pub(crate) fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<Schedule> {
    Ok(Schedule {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        interval_days: row.get(3)?,
        assignment: Assignment {
            assigned_to: row.get(4)?,
            is_both: row.get(5)?,
        },
        created_by: row.get(6)?,
        created_at_ms: row.get(7)?,
    })
}

pub(crate) fn occurrence_from_row(row: &Row<'_>) -> rusqlite::Result<TaskOccurrence> {
    Ok(TaskOccurrence {
        id: row.get(0)?,
        schedule_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        date: date_col(row, 4)?,
        original_date: date_col(row, 5)?,
        assignment: Assignment {
            assigned_to: row.get(6)?,
            is_both: row.get(7)?,
        },
        completed_at_ms: row.get(8)?,
        completed_by: row.get(9)?,
        created_at_ms: row.get(10)?,
    })
}

// --- shared validation ---

fn validate_title(value: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::InvalidInput("title must not be empty"));
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(StoreError::InvalidInput("title is too long"));
    }
    Ok(value.to_string())
}

fn validate_category(value: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.len() > MAX_TEXT_LEN {
        return Err(StoreError::InvalidInput("category is too long"));
    }
    Ok(value.to_string())
}

fn validate_interval_days(value: u32) -> Result<u32, StoreError> {
    if (1..=MAX_INTERVAL_DAYS).contains(&value) {
        Ok(value)
    } else {
        Err(StoreError::InvalidInput("interval_days must be between 1 and 3650"))
    }
}

fn validate_interval_weeks(value: u32) -> Result<u32, StoreError> {
    if (1..=MAX_INTERVAL_WEEKS).contains(&value) {
        Ok(value)
    } else {
        Err(StoreError::InvalidInput("interval_weeks must be between 1 and 52"))
    }
}

fn validate_day_of_week(value: u8) -> Result<u8, StoreError> {
    if value <= 6 {
        Ok(value)
    } else {
        Err(StoreError::InvalidInput("day_of_week must be between 0 and 6"))
    }
}

fn validate_assignment(assigned_to: Option<i64>, is_both: bool) -> Result<Assignment, StoreError> {
    Assignment::try_new(assigned_to, is_both)
        .map_err(|_| StoreError::InvalidInput("is_both excludes a single assignee"))
}

// --- generation ---

/// The only code path that materializes a schedule-linked open occurrence.
///
/// Callers must complete or remove the current open occurrence first; hitting
/// the guard means the calling sequence is broken, so it is logged loudly and
/// nothing is overwritten.
fn spawn_occurrence_tx(
    tx: &Transaction<'_>,
    schedule: &Schedule,
    from: Date,
    now_ms: i64,
) -> Result<TaskOccurrence, StoreError> {
    let open: i64 = tx.query_row(
        "SELECT COUNT(*) FROM tasks WHERE schedule_id = ?1 AND completed_at_ms IS NULL",
        params![schedule.id],
        |row| row.get(0),
    )?;
    if open > 0 {
        tracing::error!(
            schedule_id = schedule.id,
            "refusing to generate a second open occurrence"
        );
        return Err(StoreError::OpenOccurrenceExists);
    }

    let date_sql = dates::format_date(from);
    tx.execute(
        r#"
        INSERT INTO tasks(schedule_id, title, category, date, original_date,
                          assigned_to, is_both, completed_at_ms, completed_by, created_at_ms)
        VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, NULL, NULL, ?7)
        "#,
        params![
            schedule.id,
            schedule.title,
            schedule.category,
            date_sql,
            schedule.assignment.assigned_to,
            schedule.assignment.is_both,
            now_ms
        ],
    )?;

    Ok(TaskOccurrence {
        id: tx.last_insert_rowid(),
        schedule_id: Some(schedule.id),
        title: schedule.title.clone(),
        category: schedule.category.clone(),
        date: from,
        original_date: from,
        assignment: schedule.assignment,
        completed_at_ms: None,
        completed_by: None,
        created_at_ms: now_ms,
    })
}
