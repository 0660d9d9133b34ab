//! Key-value preferences persisted next to the jobs table.

use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use super::Database;
use crate::error::DataError;

#[derive(Clone)]
pub struct PreferencesStore {
  db: Arc<Database>,
}

impl PreferencesStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Read an integer preference, or `default` when it was never written.
  pub fn get_int(&self, key: &str, default: i64) -> Result<i64, DataError> {
    let conn = self.db.conn()?;
    let value: Option<i64> = conn
      .query_row(
        "SELECT value FROM preferences WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value.unwrap_or(default))
  }

  pub fn put_int(&self, key: &str, value: i64) -> Result<(), DataError> {
    let conn = self.db.conn()?;
    conn.execute(
      "INSERT OR REPLACE INTO preferences (key, value) VALUES (?, ?)",
      params![key, value],
    )?;
    Ok(())
  }
}
