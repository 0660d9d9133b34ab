mod jobs;
mod prefs;
pub mod query;
pub mod schema;

pub use jobs::JobStore;
pub use prefs::PreferencesStore;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::DataError;

/// Database connection wrapper shared by the job and preference stores
pub struct Database {
  conn: Mutex<Connection>,
}

impl Database {
  /// Open or create the database at `path`
  pub fn open(path: &Path) -> Result<Self, DataError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Private in-memory database
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, DataError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, DataError> {
    let db = Self {
      conn: Mutex::new(conn),
    };
    db.run_migrations()?;
    Ok(db)
  }

  /// Run database migrations
  fn run_migrations(&self) -> Result<(), DataError> {
    self.conn()?.execute_batch(schema::SCHEMA)?;
    Ok(())
  }

  /// Lock the connection. Callers must not hold the guard across an `.await`.
  pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, DataError> {
    self
      .conn
      .lock()
      .map_err(|e| DataError::Poisoned(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_open_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("rhino.db");
    let db = Database::open(&path).unwrap();
    assert!(path.exists());

    let count: i64 = db
      .conn()
      .unwrap()
      .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 0);
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().unwrap();
  }
}
