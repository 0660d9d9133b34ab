//! Errors raised by the data layer and the categories they are shown as.

use thiserror::Error;

/// Failure while talking to the jobs API or the local database.
#[derive(Debug, Error)]
pub enum DataError {
  #[error("database error: {0}")]
  Db(#[from] rusqlite::Error),

  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("API responded with status {status}")]
  Http { status: u16 },

  #[error("failed to decode payload: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("job {0} not found")]
  NotFound(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("lock poisoned: {0}")]
  Poisoned(String),
}

impl DataError {
  /// Category used when reporting the error to the user.
  pub fn kind(&self) -> ErrorKind {
    match self {
      DataError::Db(_) | DataError::NotFound(_) | DataError::Poisoned(_) | DataError::Io(_) => {
        ErrorKind::Db
      }
      DataError::Http { .. } | DataError::Decode(_) => ErrorKind::GenericApi,
      DataError::Request(e) if e.is_timeout() => ErrorKind::Timeout,
      DataError::Request(e) if e.is_connect() || e.is_request() => ErrorKind::Connection,
      DataError::Request(e) if e.is_status() || e.is_decode() => ErrorKind::GenericApi,
      DataError::Request(_) | DataError::Url(_) => ErrorKind::Generic,
    }
  }
}

/// Closed set of user-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Db,
  GenericApi,
  Connection,
  Timeout,
  Generic,
}

impl ErrorKind {
  pub fn message(self) -> &'static str {
    match self {
      ErrorKind::Db => "Could not read saved jobs from the local database.",
      ErrorKind::GenericApi => "The job server returned an unexpected response.",
      ErrorKind::Connection => "No connection. Showing the jobs saved on this device.",
      ErrorKind::Timeout => "The job server took too long to respond.",
      ErrorKind::Generic => "Something went wrong. Please try again.",
    }
  }
}
