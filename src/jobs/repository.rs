//! Single access point for job data from the API and the local store.
//!
//! List operations return streams: a stored snapshot may be emitted first and
//! followed by the merged result once the API answers.

use async_stream::stream;
use futures::Stream;
use std::sync::Arc;

use crate::db::query::{JobQuery, Scope};
use crate::db::JobStore;
use crate::error::DataError;
use crate::jobs::client::JobsApi;
use crate::jobs::keywords::FilterKeywords;
use crate::jobs::types::{DataResponse, DataSource, FilterOption, Job, JobInfo, SortOption};

pub type JobsResponse = DataResponse<Vec<Job>>;
pub type JobResponse = DataResponse<Job>;

const API_ERROR: &str = "Error occurred while fetching from API.";
const DB_ERROR: &str = "Error occurred while fetching from DB.";
const SAVE_ERROR: &str = "Error occurred while saving to DB.";

pub struct JobRepository<A: JobsApi> {
  store: JobStore,
  api: Arc<A>,
  keywords: Arc<FilterKeywords>,
}

impl<A: JobsApi + 'static> JobRepository<A> {
  pub fn new(store: JobStore, api: Arc<A>, keywords: Arc<FilterKeywords>) -> Self {
    Self {
      store,
      api,
      keywords,
    }
  }

  /// Stream the full job list.
  ///
  /// - Nothing stored: one emission with the API result.
  /// - Stored and `refresh`: the stored list (`show_loading`), then the merged list.
  /// - Stored, no refresh: one emission from the store.
  pub fn get_all_jobs(
    &self,
    refresh: bool,
    sort: SortOption,
    filter: FilterOption,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    let this = self.clone();
    stream! {
      let keywords = this.keywords.for_option(filter);
      tracing::debug!(filter = %keywords.name, ?sort, refresh, "loading jobs");
      let query = JobQuery::list(Scope::All, sort, keywords);

      match this.store.query(&query) {
        Err(e) => {
          tracing::error!(error = %e, "failed to read jobs from the store");
          yield DataResponse::failed(None, DataSource::Db, DB_ERROR, e);
        }
        Ok(stored) if stored.is_empty() => {
          tracing::debug!("store is empty, fetching jobs from the API");
          yield this.fetch_all_jobs(None, &query, sort, filter).await;
        }
        Ok(stored) if refresh => {
          yield DataResponse::new(stored.clone(), DataSource::Db).loading(true);
          yield this.fetch_all_jobs(Some(stored), &query, sort, filter).await;
        }
        Ok(stored) => {
          yield DataResponse::new(stored, DataSource::Db);
        }
      }
    }
  }

  /// Fetch the job list, write fresh results back and build the response.
  ///
  /// `stored` is the snapshot already shown to the caller; it is what an
  /// error response falls back to.
  async fn fetch_all_jobs(
    &self,
    stored: Option<Vec<Job>>,
    query: &JobQuery,
    sort: SortOption,
    filter: FilterOption,
  ) -> JobsResponse {
    let result = match self.api.get_job_list().await {
      Ok(result) => result,
      Err(e) => {
        tracing::error!(error = %e, "failed to fetch jobs from the API");
        return DataResponse::failed(stored, DataSource::Api, API_ERROR, e);
      }
    };

    let source = DataSource::from(result.source);
    tracing::debug!(count = result.data.len(), %source, cached_at = ?result.cached_at, "received job list");
    let jobs = result.data;

    // Cached bodies were already written back when they were fresh
    let wrote_back = if source == DataSource::Api && !jobs.is_empty() {
      if let Err(e) = self.write_back(&jobs) {
        tracing::error!(error = %e, "failed to save jobs to the store");
        let shown = stored.unwrap_or_else(|| self.sorted_and_filtered(jobs, sort, filter));
        return DataResponse::failed(Some(shown), source, SAVE_ERROR, e);
      }
      true
    } else {
      false
    };

    if stored.is_some() || wrote_back {
      // Re-read so bookmarks and fetched details show up in the merged list
      match self.store.query(query) {
        Ok(merged) => DataResponse::new(merged, source),
        Err(e) => {
          tracing::error!(error = %e, "failed to re-read jobs from the store");
          DataResponse::failed(stored, DataSource::Db, DB_ERROR, e)
        }
      }
    } else {
      DataResponse::new(self.sorted_and_filtered(jobs, sort, filter), source)
    }
  }

  /// Upsert fresh jobs and drop the ones the API no longer lists.
  fn write_back(&self, jobs: &[Job]) -> Result<(), DataError> {
    let upserted = self.store.merge_from_api(jobs)?;
    let ids: Vec<String> = jobs.iter().map(|job| job.id.clone()).collect();
    let removed = self.store.delete_missing(&ids)?;
    tracing::info!(upserted, removed, "saved jobs from the API");
    Ok(())
  }

  fn sorted_and_filtered(&self, mut jobs: Vec<Job>, sort: SortOption, filter: FilterOption) -> Vec<Job> {
    let keywords = self.keywords.for_option(filter);
    if !keywords.is_empty() {
      jobs.retain(|job| keywords.matches(job));
    }
    jobs.sort_by(|a, b| sort.compare(a, b));
    jobs
  }

  /// Stream bookmarked jobs from the store.
  pub fn get_bookmarked_jobs(
    &self,
    sort: SortOption,
    filter: FilterOption,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    let query = JobQuery::list(Scope::Bookmarked, sort, self.keywords.for_option(filter));
    let store = self.store.clone();
    stream! {
      yield query_store(&store, &query);
    }
  }

  /// Stream stored jobs whose position or tags contain `text`.
  pub fn search_all_jobs(
    &self,
    sort: SortOption,
    text: &str,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self.search(Scope::All, sort, text)
  }

  /// Same as `search_all_jobs`, limited to bookmarked jobs.
  pub fn search_bookmarked_jobs(
    &self,
    sort: SortOption,
    text: &str,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self.search(Scope::Bookmarked, sort, text)
  }

  fn search(
    &self,
    scope: Scope,
    sort: SortOption,
    text: &str,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    let query = JobQuery::search(scope, sort, text);
    let text = text.to_string();
    let store = self.store.clone();
    stream! {
      yield query_store(&store, &query).with_query(text);
    }
  }

  /// Stream a single job, fetching its details when they are missing.
  pub fn get_job_info(&self, id: &str) -> impl Stream<Item = JobResponse> + Send + 'static {
    let this = self.clone();
    let id = id.to_string();
    stream! {
      match this.store.get_by_id(&id) {
        Err(e) => {
          tracing::error!(%id, error = %e, "failed to read job from the store");
          yield DataResponse::failed(None, DataSource::Db, DB_ERROR, e);
        }
        Ok(None) => {
          yield DataResponse::failed(None, DataSource::Db, DB_ERROR, DataError::NotFound(id.clone()));
        }
        Ok(Some(job)) if job.additional_info.is_some() => {
          yield DataResponse::new(job, DataSource::Db);
        }
        Ok(Some(job)) => {
          yield DataResponse::new(job.clone(), DataSource::Db).loading(true);
          yield this.fetch_job_info(job).await;
        }
      }
    }
  }

  async fn fetch_job_info(&self, mut job: Job) -> JobResponse {
    let result = match self.api.get_job_info(&job.id).await {
      Ok(result) => result,
      Err(e) => {
        tracing::error!(id = %job.id, error = %e, "failed to fetch job info from the API");
        return DataResponse::failed(Some(job), DataSource::Api, API_ERROR, e);
      }
    };

    let source = DataSource::from(result.source);
    let info: JobInfo = result.data;
    if let Err(e) = self.store.set_additional_info(&job.id, &info) {
      tracing::error!(id = %job.id, error = %e, "failed to save job info");
      job.additional_info = Some(info);
      return DataResponse::failed(Some(job), source, SAVE_ERROR, e);
    }

    match self.store.get_by_id(&job.id) {
      Ok(Some(updated)) => DataResponse::new(updated, source),
      Ok(None) => {
        job.additional_info = Some(info);
        DataResponse::new(job, source)
      }
      Err(e) => DataResponse::failed(Some(job), DataSource::Db, DB_ERROR, e),
    }
  }

  /// Insert or fully replace jobs. Returns the number of rows written.
  pub fn update_jobs(&self, jobs: &[Job]) -> Result<usize, DataError> {
    let updated = self.store.upsert(jobs)?;
    tracing::debug!(updated, "updated jobs in the store");
    Ok(updated)
  }

  /// Flip the bookmark flag of a stored job and return the updated job.
  pub fn toggle_bookmark(&self, id: &str) -> Result<Job, DataError> {
    let mut job = self
      .store
      .get_by_id(id)?
      .ok_or_else(|| DataError::NotFound(id.to_string()))?;
    job.is_bookmarked = !job.is_bookmarked;
    self.store.set_bookmarked(id, job.is_bookmarked)?;
    tracing::debug!(%id, bookmarked = job.is_bookmarked, "toggled bookmark");
    Ok(job)
  }

  /// Delete every stored job.
  pub fn clear(&self) -> Result<usize, DataError> {
    let removed = self.store.delete_all()?;
    tracing::info!(removed, "cleared stored jobs");
    Ok(removed)
  }
}

impl<A: JobsApi> Clone for JobRepository<A> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      api: Arc::clone(&self.api),
      keywords: Arc::clone(&self.keywords),
    }
  }
}

fn query_store(store: &JobStore, query: &JobQuery) -> JobsResponse {
  match store.query(query) {
    Ok(jobs) => DataResponse::new(jobs, DataSource::Db),
    Err(e) => {
      tracing::error!(error = %e, "failed to read jobs from the store");
      DataResponse::failed(None, DataSource::Db, DB_ERROR, e)
    }
  }
}
