#![forbid(unsafe_code)]

use super::*;
use cb_core::model::DailyScheduleEntry;
use rusqlite::{OptionalExtension, Row, params};

const ENTRY_COLUMNS: &str = "id, user_id, day_of_week, label, interval_weeks, reference_date";

impl SqliteStore {
    pub fn create_daily_entry(
        &mut self,
        request: CreateDailyEntryRequest,
    ) -> Result<DailyScheduleEntry, StoreError> {
        let CreateDailyEntryRequest {
            user_id,
            day_of_week,
            label,
            interval_weeks,
            reference_date,
        } = request;

        let day_of_week = validate_day_of_week(day_of_week)?;
        let label = validate_title(&label)?;
        let interval_weeks = validate_interval_weeks(interval_weeks)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO daily_entries(user_id, day_of_week, label, interval_weeks, reference_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                user_id,
                day_of_week,
                label,
                interval_weeks,
                reference_date.map(dates::format_date)
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(DailyScheduleEntry {
            id,
            user_id,
            day_of_week,
            label,
            interval_weeks,
            reference_date,
        })
    }

    pub fn update_daily_entry(
        &mut self,
        request: UpdateDailyEntryRequest,
    ) -> Result<DailyScheduleEntry, StoreError> {
        let UpdateDailyEntryRequest {
            id,
            user_id,
            day_of_week,
            label,
            interval_weeks,
            reference_date,
        } = request;

        if user_id.is_none()
            && day_of_week.is_none()
            && label.is_none()
            && interval_weeks.is_none()
            && reference_date.is_none()
        {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }

        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM daily_entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()?;

        let Some(current) = current else {
            return Err(StoreError::UnknownEntry);
        };

        let user_id = user_id.unwrap_or(current.user_id);
        let day_of_week = match day_of_week {
            Some(value) => validate_day_of_week(value)?,
            None => current.day_of_week,
        };
        let label = match label {
            Some(value) => validate_title(&value)?,
            None => current.label,
        };
        let interval_weeks = match interval_weeks {
            Some(value) => validate_interval_weeks(value)?,
            None => current.interval_weeks,
        };
        let reference_date = reference_date.unwrap_or(current.reference_date);

        tx.execute(
            r#"
            UPDATE daily_entries
            SET user_id = ?2, day_of_week = ?3, label = ?4, interval_weeks = ?5,
                reference_date = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                user_id,
                day_of_week,
                label,
                interval_weeks,
                reference_date.map(dates::format_date)
            ],
        )?;
        tx.commit()?;

        Ok(DailyScheduleEntry {
            id,
            user_id,
            day_of_week,
            label,
            interval_weeks,
            reference_date,
        })
    }

    pub fn delete_daily_entry(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM daily_entries WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::UnknownEntry);
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_daily_entries(&self) -> Result<Vec<DailyScheduleEntry>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM daily_entries ORDER BY day_of_week ASC, id ASC"
        ))?;
        let rows = stmt.query_map([], entry_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Entries that recur on the given date, per the weekly/biweekly matcher.
    pub fn daily_entries_on(&self, date: Date) -> Result<Vec<DailyScheduleEntry>, StoreError> {
        let entries = self.list_daily_entries()?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.applies_on(date))
            .collect())
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DailyScheduleEntry> {
    Ok(DailyScheduleEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        day_of_week: row.get(2)?,
        label: row.get(3)?,
        interval_weeks: row.get(4)?,
        reference_date: opt_date_col(row, 5)?,
    })
}
