//! Facade over the job repository and the persisted list preferences.

use futures::Stream;

use crate::db::PreferencesStore;
use crate::error::DataError;
use crate::jobs::client::JobsApi;
use crate::jobs::repository::{JobRepository, JobResponse, JobsResponse};
use crate::jobs::types::{FilterOption, Job, ListKind, SortOption};

const SORT_OPTION_ALL_KEY: &str = "sort_option.all";
const SORT_OPTION_BOOKMARKED_KEY: &str = "sort_option.bookmarked";
const FILTER_OPTION_ALL_KEY: &str = "filter_option.all";
const FILTER_OPTION_BOOKMARKED_KEY: &str = "filter_option.bookmarked";

/// Entry point used by the front end
pub struct DataManager<A: JobsApi> {
  repository: JobRepository<A>,
  prefs: PreferencesStore,
}

impl<A: JobsApi + 'static> DataManager<A> {
  pub fn new(repository: JobRepository<A>, prefs: PreferencesStore) -> Self {
    Self { repository, prefs }
  }

  /// Full job list using the saved sort and filter of the "all" list.
  pub fn get_all_jobs(&self, refresh: bool) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self.repository.get_all_jobs(
      refresh,
      self.current_sort(ListKind::All),
      self.current_filter(ListKind::All),
    )
  }

  pub fn get_bookmarked_jobs(&self) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self.repository.get_bookmarked_jobs(
      self.current_sort(ListKind::Bookmarked),
      self.current_filter(ListKind::Bookmarked),
    )
  }

  pub fn search_all_jobs(&self, text: &str) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self
      .repository
      .search_all_jobs(self.current_sort(ListKind::All), text)
  }

  pub fn search_bookmarked_jobs(
    &self,
    text: &str,
  ) -> impl Stream<Item = JobsResponse> + Send + 'static {
    self
      .repository
      .search_bookmarked_jobs(self.current_sort(ListKind::Bookmarked), text)
  }

  pub fn get_job_info(&self, id: &str) -> impl Stream<Item = JobResponse> + Send + 'static {
    self.repository.get_job_info(id)
  }

  pub fn update_jobs(&self, jobs: &[Job]) -> Result<usize, DataError> {
    self.repository.update_jobs(jobs)
  }

  pub fn toggle_bookmark(&self, id: &str) -> Result<Job, DataError> {
    self.repository.toggle_bookmark(id)
  }

  pub fn clear_jobs(&self) -> Result<usize, DataError> {
    self.repository.clear()
  }

  pub fn save_sort_option(&self, list: ListKind, option: SortOption) -> Result<(), DataError> {
    self.prefs.put_int(sort_key(list), option.code())
  }

  pub fn sort_option(&self, list: ListKind) -> Result<SortOption, DataError> {
    Ok(SortOption::from_code(self.prefs.get_int(sort_key(list), 0)?))
  }

  pub fn save_filter_option(&self, list: ListKind, option: FilterOption) -> Result<(), DataError> {
    self.prefs.put_int(filter_key(list), option.code())
  }

  pub fn filter_option(&self, list: ListKind) -> Result<FilterOption, DataError> {
    Ok(FilterOption::from_code(self.prefs.get_int(filter_key(list), 0)?))
  }

  // An unreadable preference must not block listing jobs
  fn current_sort(&self, list: ListKind) -> SortOption {
    self.sort_option(list).unwrap_or_else(|e| {
      tracing::warn!(?list, error = %e, "failed to read sort option, using default");
      SortOption::default()
    })
  }

  fn current_filter(&self, list: ListKind) -> FilterOption {
    self.filter_option(list).unwrap_or_else(|e| {
      tracing::warn!(?list, error = %e, "failed to read filter option, using default");
      FilterOption::default()
    })
  }
}

fn sort_key(list: ListKind) -> &'static str {
  match list {
    ListKind::All => SORT_OPTION_ALL_KEY,
    ListKind::Bookmarked => SORT_OPTION_BOOKMARKED_KEY,
  }
}

fn filter_key(list: ListKind) -> &'static str {
  match list {
    ListKind::All => FILTER_OPTION_ALL_KEY,
    ListKind::Bookmarked => FILTER_OPTION_BOOKMARKED_KEY,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::{Database, JobStore};
  use crate::jobs::repository::tests::{test_keywords, FakeApi};
  use crate::jobs::types::sample_job;
  use futures::StreamExt;
  use std::sync::Arc;

  fn manager() -> DataManager<FakeApi> {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let repository = JobRepository::new(
      JobStore::new(db.clone()),
      Arc::new(FakeApi::new(vec![])),
      Arc::new(test_keywords()),
    );
    DataManager::new(repository, PreferencesStore::new(db))
  }

  fn ids(response: &JobsResponse) -> Vec<&str> {
    response
      .data
      .as_ref()
      .unwrap()
      .iter()
      .map(|j| j.id.as_str())
      .collect()
  }

  #[test]
  fn test_options_default_and_persist_per_list() {
    let manager = manager();
    assert_eq!(manager.sort_option(ListKind::All).unwrap(), SortOption::ByPostingDate);
    assert_eq!(
      manager.filter_option(ListKind::Bookmarked).unwrap(),
      FilterOption::AllListings
    );

    manager
      .save_sort_option(ListKind::All, SortOption::ByCompanyName)
      .unwrap();
    manager
      .save_filter_option(ListKind::Bookmarked, FilterOption::Design)
      .unwrap();

    assert_eq!(manager.sort_option(ListKind::All).unwrap(), SortOption::ByCompanyName);
    assert_eq!(
      manager.sort_option(ListKind::Bookmarked).unwrap(),
      SortOption::ByPostingDate
    );
    assert_eq!(
      manager.filter_option(ListKind::Bookmarked).unwrap(),
      FilterOption::Design
    );
    assert_eq!(manager.filter_option(ListKind::All).unwrap(), FilterOption::AllListings);
  }

  #[tokio::test]
  async fn test_saved_options_shape_queries() {
    let manager = manager();
    let mut rust = sample_job("rust", 1, "Zeta", "Engineer");
    rust.tags = vec!["rust".into()];
    manager
      .update_jobs(&[
        rust,
        sample_job("design", 2, "Acme", "Product designer"),
        sample_job("other", 3, "Mid", "Writer"),
      ])
      .unwrap();

    let responses: Vec<_> = manager.get_all_jobs(false).collect().await;
    assert_eq!(ids(&responses[0]), vec!["other", "design", "rust"]);

    manager
      .save_sort_option(ListKind::All, SortOption::ByCompanyName)
      .unwrap();
    let responses: Vec<_> = manager.get_all_jobs(false).collect().await;
    assert_eq!(ids(&responses[0]), vec!["design", "other", "rust"]);

    manager
      .save_filter_option(ListKind::All, FilterOption::Technical)
      .unwrap();
    let responses: Vec<_> = manager.get_all_jobs(false).collect().await;
    assert_eq!(ids(&responses[0]), vec!["rust"]);
  }

  #[tokio::test]
  async fn test_bookmarked_list_uses_its_own_options() {
    let manager = manager();
    manager
      .update_jobs(&[
        sample_job("a", 1, "Zeta", "Designer"),
        sample_job("b", 2, "Acme", "Designer"),
        sample_job("c", 3, "Mid", "Writer"),
      ])
      .unwrap();
    manager.toggle_bookmark("a").unwrap();
    manager.toggle_bookmark("b").unwrap();
    manager
      .save_sort_option(ListKind::Bookmarked, SortOption::ByCompanyName)
      .unwrap();
    manager
      .save_filter_option(ListKind::Bookmarked, FilterOption::Design)
      .unwrap();

    let responses: Vec<_> = manager.get_bookmarked_jobs().collect().await;
    assert_eq!(ids(&responses[0]), vec!["b", "a"]);

    let found: Vec<_> = manager.search_bookmarked_jobs("designer").collect().await;
    assert_eq!(ids(&found[0]), vec!["b", "a"]);
  }

  #[test]
  fn test_clear_jobs() {
    let manager = manager();
    manager.update_jobs(&[sample_job("a", 1, "A", "x")]).unwrap();
    assert_eq!(manager.clear_jobs().unwrap(), 1);
  }
}
