//! HTTP response cache.
//!
//! Response bodies are kept in SQLite keyed by request URL:
//! - A body younger than the max age is served without touching the network
//! - Older or missing bodies are fetched again and replace the cached copy
//! - Total stored size is capped; the oldest bodies are evicted first

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
