//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::DataError;

/// A single cached response body.
#[derive(Debug, Clone)]
pub struct CachedBody {
  pub body: Vec<u8>,
  /// When the body was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get a body by cache key.
  fn get(&self, key: &str) -> Result<Option<CachedBody>, DataError>;

  /// Store a body, replacing any previous one for the key.
  fn put(&self, key: &str, url: &str, body: &[u8], cached_at: DateTime<Utc>)
    -> Result<(), DataError>;

  /// Evict oldest bodies until the total size is at most `max_bytes`.
  /// Returns the number of evicted entries.
  fn prune(&self, max_bytes: u64) -> Result<usize, DataError>;

  /// Drop everything.
  fn clear(&self) -> Result<(), DataError>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<CachedBody>, DataError> {
    Ok(None) // Always miss
  }

  fn put(
    &self,
    _key: &str,
    _url: &str,
    _body: &[u8],
    _cached_at: DateTime<Utc>,
  ) -> Result<(), DataError> {
    Ok(()) // Discard
  }

  fn prune(&self, _max_bytes: u64) -> Result<usize, DataError> {
    Ok(0)
  }

  fn clear(&self) -> Result<(), DataError> {
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open or create the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self, DataError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    Self::with_connection(Connection::open(path)?)
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self, DataError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, DataError> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default cache database path.
  pub fn default_path() -> Option<PathBuf> {
    let cache_dir = dirs::cache_dir().or_else(|| dirs::home_dir().map(|p| p.join(".cache")))?;
    Some(cache_dir.join("rhino").join("http-cache.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DataError> {
    self
      .conn
      .lock()
      .map_err(|e| DataError::Poisoned(e.to_string()))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<(), DataError> {
    self.lock()?.execute_batch(CACHE_SCHEMA)?;
    Ok(())
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    cache_key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    body BLOB NOT NULL,
    size INTEGER NOT NULL,
    -- epoch milliseconds
    cached_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_response_cache_age ON response_cache(cached_at);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<CachedBody>, DataError> {
    let conn = self.lock()?;

    let row: Option<(Vec<u8>, i64)> = conn
      .query_row(
        "SELECT body, cached_at FROM response_cache WHERE cache_key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    Ok(row.map(|(body, millis)| CachedBody {
      body,
      cached_at: parse_millis(millis),
    }))
  }

  fn put(
    &self,
    key: &str,
    url: &str,
    body: &[u8],
    cached_at: DateTime<Utc>,
  ) -> Result<(), DataError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO response_cache (cache_key, url, body, size, cached_at)
       VALUES (?, ?, ?, ?, ?)",
      params![key, url, body, body.len() as i64, cached_at.timestamp_millis()],
    )?;
    Ok(())
  }

  fn prune(&self, max_bytes: u64) -> Result<usize, DataError> {
    let conn = self.lock()?;

    let mut stmt =
      conn.prepare("SELECT cache_key, size FROM response_cache ORDER BY cached_at DESC")?;
    let entries = stmt
      .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
      .collect::<Result<Vec<_>, _>>()?;

    // Keep newest entries while they fit
    let mut total: u64 = 0;
    let mut evict = Vec::new();
    for (key, size) in entries {
      total += size.max(0) as u64;
      if total > max_bytes {
        evict.push(key);
      }
    }

    for key in &evict {
      conn.execute("DELETE FROM response_cache WHERE cache_key = ?", params![key])?;
    }

    Ok(evict.len())
  }

  fn clear(&self) -> Result<(), DataError> {
    self.lock()?.execute("DELETE FROM response_cache", [])?;
    Ok(())
  }
}

/// Convert stored epoch milliseconds back to a timestamp.
fn parse_millis(millis: i64) -> DateTime<Utc> {
  DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
