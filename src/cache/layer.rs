//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;

use super::storage::CacheStorage;
use super::traits::CacheResult;
use crate::error::DataError;

/// Default 10 MiB cap on stored bodies
const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Cache layer that manages caching logic and network fetching.
///
/// Bodies younger than `max_age` are served without calling the fetcher.
/// Network failures are returned as errors; an expired body is never used
/// to mask them.
pub struct CacheLayer<S: CacheStorage + ?Sized> {
  storage: Arc<S>,
  /// How long a stored body may be served without revalidation
  max_age: Duration,
  /// Upper bound on the total size of stored bodies
  max_size_bytes: u64,
}

impl<S: CacheStorage + ?Sized> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<S>) -> Self {
    Self {
      storage,
      max_age: Duration::minutes(10),
      max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
    }
  }

  /// Set the max age for cached data.
  pub fn with_max_age(mut self, max_age: Duration) -> Self {
    self.max_age = max_age;
    self
  }

  /// Set the size cap for cached data.
  pub fn with_max_size(mut self, max_size_bytes: u64) -> Self {
    self.max_size_bytes = max_size_bytes;
    self
  }

  /// Check if cached data has outlived the max age.
  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at >= self.max_age
  }

  /// Fetch and decode the body for `url`, serving it from cache while fresh.
  ///
  /// 1. Check cache - if fresh and decodable, return immediately
  /// 2. If stale/missing/undecodable, fetch from network
  /// 3. Decode the new body, then store it and enforce the size cap
  ///
  /// Bodies that fail to decode are returned as errors and never stored.
  pub async fn fetch<T, F, Fut, D>(
    &self,
    url: &str,
    fetcher: F,
    decode: D,
  ) -> Result<CacheResult<T>, DataError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<u8>, DataError>>,
    D: Fn(&[u8]) -> Result<T, DataError>,
  {
    let key = cache_key(url);

    match self.storage.get(&key) {
      Ok(Some(cached)) if !self.is_stale(cached.cached_at) => match decode(&cached.body) {
        Ok(data) => {
          tracing::debug!(url, "serving response from cache");
          return Ok(CacheResult::from_cache(data, cached.cached_at));
        }
        Err(e) => tracing::warn!(url, error = %e, "cached response is unreadable, refetching"),
      },
      Ok(_) => {}
      // A broken cache must not block the network path
      Err(e) => tracing::warn!(url, error = %e, "response cache lookup failed"),
    }

    let body = fetcher().await?;
    let data = decode(&body)?;

    if let Err(e) = self.store(&key, url, &body) {
      tracing::warn!(url, error = %e, "failed to store response in cache");
    }

    Ok(CacheResult::from_network(data))
  }

  fn store(&self, key: &str, url: &str, body: &[u8]) -> Result<(), DataError> {
    self.storage.put(key, url, body, Utc::now())?;
    let evicted = self.storage.prune(self.max_size_bytes)?;
    if evicted > 0 {
      tracing::debug!(evicted, "pruned response cache");
    }
    Ok(())
  }

  /// Remove every cached body.
  pub fn clear(&self) -> Result<(), DataError> {
    self.storage.clear()
  }
}

impl<S: CacheStorage + ?Sized> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      max_age: self.max_age,
      max_size_bytes: self.max_size_bytes,
    }
  }
}

/// SHA256 of the URL for stable, fixed-length keys
fn cache_key(url: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(url.as_bytes());
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, NoopStorage, SqliteStorage};
  use std::sync::atomic::{AtomicU32, Ordering};

  const URL: &str = "https://api.example.com/v1/jobs?from=test";

  fn counting_fetch<'a>(
    counter: &'a AtomicU32,
    body: &'static [u8],
  ) -> impl Future<Output = Result<Vec<u8>, DataError>> + 'a {
    async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(body.to_vec())
    }
  }

  fn numbers(body: &[u8]) -> Result<Vec<u32>, DataError> {
    Ok(serde_json::from_slice(body)?)
  }

  fn memory_layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(Arc::new(SqliteStorage::open_in_memory().unwrap()))
  }

  #[tokio::test]
  async fn test_fresh_body_served_from_cache() {
    let layer = memory_layer();
    let calls = AtomicU32::new(0);

    let first = layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = layer.fetch(URL, || counting_fetch(&calls, b"[2]"), numbers).await.unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, vec![1]);
    assert!(second.cached_at.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_body_is_refetched() {
    let layer = memory_layer().with_max_age(Duration::zero());
    let calls = AtomicU32::new(0);

    layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    let second = layer.fetch(URL, || counting_fetch(&calls, b"[2]"), numbers).await.unwrap();

    assert_eq!(second.source, CacheSource::Network);
    assert_eq!(second.data, vec![2]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_network_error_not_masked_by_expired_body() {
    let layer = memory_layer().with_max_age(Duration::zero());
    let calls = AtomicU32::new(0);

    layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    let result = layer
      .fetch(URL, || async { Err(DataError::Http { status: 502 }) }, numbers)
      .await;

    assert!(matches!(result, Err(DataError::Http { status: 502 })));
  }

  #[tokio::test]
  async fn test_undecodable_body_is_not_cached() {
    let layer = memory_layer();
    let calls = AtomicU32::new(0);

    let first = layer
      .fetch(URL, || counting_fetch(&calls, b"<html>oops</html>"), numbers)
      .await;
    assert!(matches!(first, Err(DataError::Decode(_))));

    let second = layer.fetch(URL, || counting_fetch(&calls, b"[]"), numbers).await.unwrap();
    assert_eq!(second.source, CacheSource::Network);
    assert!(second.data.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_unreadable_cached_body_is_refetched() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage
      .put(&cache_key(URL), URL, b"{truncated", Utc::now())
      .unwrap();
    let layer = CacheLayer::new(storage);
    let calls = AtomicU32::new(0);

    let result = layer.fetch(URL, || counting_fetch(&calls, b"[3]"), numbers).await.unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data, vec![3]);

    let again = layer.fetch(URL, || counting_fetch(&calls, b"[4]"), numbers).await.unwrap();
    assert_eq!(again.source, CacheSource::Cache);
    assert_eq!(again.data, vec![3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_distinct_urls_do_not_collide() {
    let layer = memory_layer();
    let calls = AtomicU32::new(0);

    layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    let other = layer
      .fetch("https://api.example.com/v1/job?id=1", || counting_fetch(&calls, b"[]"), numbers)
      .await
      .unwrap();

    assert_eq!(other.source, CacheSource::Network);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_noop_storage_always_hits_network() {
    let storage: Arc<dyn CacheStorage> = Arc::new(NoopStorage);
    let layer = CacheLayer::new(storage);
    let calls = AtomicU32::new(0);

    layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    layer.fetch(URL, || counting_fetch(&calls, b"[1]"), numbers).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_cache_key_is_hex_sha256() {
    let key = cache_key(URL);
    assert_eq!(key.len(), 64);
    assert_eq!(key, cache_key(URL));
    assert_ne!(key, cache_key("https://api.example.com/v1/jobs"));
  }
}
