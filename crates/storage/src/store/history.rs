#![forbid(unsafe_code)]

use super::*;
use cb_core::model::StatsRow;
use cb_core::week;
use rusqlite::{Params, Row, params};

const STATS_QUERY: &str = r#"
    SELECT c.id, c.task_id, t.title, t.date, c.user_id, u.name, c.week, c.year,
           c.completed_at_ms
    FROM completed_tasks c
    LEFT JOIN tasks t ON t.id = c.task_id
    LEFT JOIN users u ON u.id = c.user_id
"#;

const STATS_ORDER: &str = " ORDER BY c.completed_at_ms DESC, c.id DESC";

impl SqliteStore {
    /// History rows for one ISO week bucket, joined for display.
    pub fn completed_for_week(&self, week: u8, year: i32) -> Result<Vec<StatsRow>, StoreError> {
        self.stats_rows(
            &format!("{STATS_QUERY} WHERE c.week = ?1 AND c.year = ?2{STATS_ORDER}"),
            params![week, year],
        )
    }

    /// Aggregated history for a display period, relative to the caller's
    /// `today`. Rows with deleted tasks or users keep their place with the
    /// joined fields nulled out.
    pub fn completion_stats(
        &self,
        period: StatsPeriod,
        today: Date,
    ) -> Result<Vec<StatsRow>, StoreError> {
        let bucket = week::bucket_of(today);
        match period {
            StatsPeriod::Week => self.stats_rows(
                &format!("{STATS_QUERY} WHERE c.week = ?1 AND c.year = ?2{STATS_ORDER}"),
                params![bucket.week, bucket.year],
            ),
            StatsPeriod::Month => {
                let span = week::month_week_span(today);
                self.stats_rows(
                    &format!(
                        "{STATS_QUERY} WHERE c.year = ?1 AND c.week >= ?2 AND c.week <= ?3{STATS_ORDER}"
                    ),
                    params![bucket.year, *span.start(), *span.end()],
                )
            }
            StatsPeriod::Year => self.stats_rows(
                &format!("{STATS_QUERY} WHERE c.year = ?1{STATS_ORDER}"),
                params![bucket.year],
            ),
            StatsPeriod::All => self.stats_rows(&format!("{STATS_QUERY}{STATS_ORDER}"), params![]),
        }
    }

    fn stats_rows(&self, sql: &str, params: impl Params) -> Result<Vec<StatsRow>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, stats_row_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn stats_row_from_row(row: &Row<'_>) -> rusqlite::Result<StatsRow> {
    Ok(StatsRow {
        id: row.get(0)?,
        task_id: row.get(1)?,
        task_title: row.get(2)?,
        task_date: opt_date_col(row, 3)?,
        user_id: row.get(4)?,
        user_name: row.get(5)?,
        week: row.get(6)?,
        year: row.get(7)?,
        completed_at_ms: row.get(8)?,
    })
}
