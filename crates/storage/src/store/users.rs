#![forbid(unsafe_code)]

use super::*;
use cb_core::model::User;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    pub fn create_user(&mut self, name: &str, created_at_ms: i64) -> Result<User, StoreError> {
        let name = validate_title(name)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO users(name, created_at_ms) VALUES (?1, ?2)",
            params![name, created_at_ms],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(User {
            id,
            name,
            created_at_ms,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, created_at_ms FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at_ms: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::UnknownUser)
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at_ms FROM users ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at_ms: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// History rows keep their user reference; deleting a user only makes
    /// joined display fields come back empty.
    pub fn delete_user(&mut self, id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::UnknownUser);
        }
        tx.commit()?;
        Ok(())
    }
}
