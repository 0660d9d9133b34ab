use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::cache::{CacheLayer, CacheResult, CacheSource, CacheStorage};
use crate::config::ApiConfig;
use crate::error::DataError;
use crate::jobs::api_types::{parse_job_info, parse_job_list};
use crate::jobs::types::{DataSource, Job, JobInfo};

/// Remote source of job postings.
#[async_trait]
pub trait JobsApi: Send + Sync {
  /// `GET /jobs`: the full current listing
  async fn get_job_list(&self) -> Result<CacheResult<Vec<Job>>, DataError>;

  /// `GET /job`: details for one posting
  async fn get_job_info(&self, id: &str) -> Result<CacheResult<JobInfo>, DataError>;
}

impl From<CacheSource> for DataSource {
  fn from(source: CacheSource) -> Self {
    match source {
      CacheSource::Network => DataSource::Api,
      CacheSource::Cache => DataSource::Cache,
    }
  }
}

/// HTTP client for the jobs API
#[derive(Clone)]
pub struct JobsClient {
  http: reqwest::Client,
  base_url: Url,
  data_source: String,
  cache: CacheLayer<dyn CacheStorage>,
}

impl JobsClient {
  pub fn new(config: &ApiConfig, cache: CacheLayer<dyn CacheStorage>) -> Result<Self, DataError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let http = reqwest::Client::builder()
      .connect_timeout(timeout)
      .timeout(timeout)
      .user_agent(concat!("rhino/", env!("CARGO_PKG_VERSION")))
      .build()?;

    // Url::join drops the last path segment unless it ends with a slash
    let mut base = config.base_url.trim().to_string();
    if !base.ends_with('/') {
      base.push('/');
    }

    Ok(Self {
      http,
      base_url: Url::parse(&base)?,
      data_source: config.data_source.clone(),
      cache,
    })
  }

  fn jobs_url(&self) -> Result<Url, DataError> {
    let mut url = self.base_url.join("jobs")?;
    url
      .query_pairs_mut()
      .append_pair("from", &self.data_source);
    Ok(url)
  }

  fn job_url(&self, id: &str) -> Result<Url, DataError> {
    let mut url = self.base_url.join("job")?;
    url
      .query_pairs_mut()
      .append_pair("id", id)
      .append_pair("from", &self.data_source);
    Ok(url)
  }

  async fn get_body(&self, url: &Url) -> Result<Vec<u8>, DataError> {
    tracing::debug!(%url, "GET");
    let response = self.http.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
      tracing::warn!(%url, status = status.as_u16(), "jobs API returned an error status");
      return Err(DataError::Http {
        status: status.as_u16(),
      });
    }

    let body = response.bytes().await?;
    tracing::debug!(%url, bytes = body.len(), "response received");
    Ok(body.to_vec())
  }

  /// Drop every cached response body.
  pub fn clear_cache(&self) -> Result<(), DataError> {
    self.cache.clear()
  }
}

#[async_trait]
impl JobsApi for JobsClient {
  async fn get_job_list(&self) -> Result<CacheResult<Vec<Job>>, DataError> {
    let url = self.jobs_url()?;
    self
      .cache
      .fetch(url.as_str(), || self.get_body(&url), |body| Ok(parse_job_list(body)?))
      .await
  }

  async fn get_job_info(&self, id: &str) -> Result<CacheResult<JobInfo>, DataError> {
    let url = self.job_url(id)?;
    self
      .cache
      .fetch(url.as_str(), || self.get_body(&url), |body| Ok(parse_job_info(body)?))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{NoopStorage, SqliteStorage};
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  fn client_for(base_url: &str, storage: Arc<dyn CacheStorage>) -> JobsClient {
    let config = ApiConfig {
      base_url: base_url.to_string(),
      data_source: "remoteok".to_string(),
      timeout_secs: 5,
    };
    JobsClient::new(&config, CacheLayer::new(storage)).unwrap()
  }

  /// Serve `body` with `status` to every connection, counting requests.
  async fn serve(status: &'static str, body: &'static str) -> (String, Arc<AtomicU32>) {
    serve_in_turn(vec![(status, body)]).await
  }

  /// Serve `responses` one per connection in order, repeating the last one.
  async fn serve_in_turn(
    responses: Vec<(&'static str, &'static str)>,
  ) -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
      loop {
        let Ok((mut socket, _)) = listener.accept().await else {
          break;
        };
        let served = counter.fetch_add(1, Ordering::SeqCst) as usize;
        let (status, body) = responses[served.min(responses.len() - 1)];
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
          "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
          status,
          body.len(),
          body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
      }
    });

    (format!("http://{}/v1", addr), hits)
  }

  #[test]
  fn test_urls_carry_data_source() {
    let client = client_for("https://rhino-app.herokuapp.com/v1/", Arc::new(NoopStorage));
    assert_eq!(
      client.jobs_url().unwrap().as_str(),
      "https://rhino-app.herokuapp.com/v1/jobs?from=remoteok"
    );
    assert_eq!(
      client.job_url("a b").unwrap().as_str(),
      "https://rhino-app.herokuapp.com/v1/job?id=a+b&from=remoteok"
    );
  }

  #[test]
  fn test_base_url_without_trailing_slash() {
    let client = client_for("https://rhino-app.herokuapp.com/v1", Arc::new(NoopStorage));
    assert_eq!(
      client.jobs_url().unwrap().as_str(),
      "https://rhino-app.herokuapp.com/v1/jobs?from=remoteok"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    let config = ApiConfig {
      base_url: "not a url".to_string(),
      ..ApiConfig::default()
    };
    let result = JobsClient::new(&config, CacheLayer::new(Arc::new(NoopStorage)));
    assert!(matches!(result, Err(DataError::Url(_))));
  }

  #[tokio::test]
  async fn test_job_list_then_cache_hit() {
    let (base, hits) = serve(
      "200 OK",
      r#"[{"id":"1","postingTime":1000,"company":"Acme","position":"Engineer","tags":["rust"]}]"#,
    )
    .await;
    let client = client_for(&base, Arc::new(SqliteStorage::open_in_memory().unwrap()));

    let first = client.get_job_list().await.unwrap();
    assert_eq!(DataSource::from(first.source), DataSource::Api);
    assert_eq!(first.data.len(), 1);
    assert_eq!(first.data[0].company, "Acme");

    let second = client.get_job_list().await.unwrap();
    assert_eq!(DataSource::from(second.source), DataSource::Cache);
    assert_eq!(second.data, first.data);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_error_status_maps_to_http_error() {
    let (base, _) = serve("503 Service Unavailable", "{}").await;
    let client = client_for(&base, Arc::new(NoopStorage));

    let err = client.get_job_info("1").await.unwrap_err();
    assert!(matches!(err, DataError::Http { status: 503 }));
  }

  #[tokio::test]
  async fn test_malformed_body_is_decode_error() {
    let (base, _) = serve("200 OK", "not json").await;
    let client = client_for(&base, Arc::new(NoopStorage));

    let err = client.get_job_list().await.unwrap_err();
    assert!(matches!(err, DataError::Decode(_)));
  }

  #[tokio::test]
  async fn test_malformed_body_is_not_cached() {
    let (base, hits) = serve_in_turn(vec![
      ("200 OK", "not json"),
      ("200 OK", r#"[{"id":"1","postingTime":1000,"company":"Acme","position":"Engineer"}]"#),
    ])
    .await;
    let client = client_for(&base, Arc::new(SqliteStorage::open_in_memory().unwrap()));

    let err = client.get_job_list().await.unwrap_err();
    assert!(matches!(err, DataError::Decode(_)));

    let retry = client.get_job_list().await.unwrap();
    assert_eq!(DataSource::from(retry.source), DataSource::Api);
    assert_eq!(retry.data[0].id, "1");
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }
}
