use crate::cache::{CacheLayer, CacheStorage, NoopStorage, SqliteStorage};
use crate::config::Config;
use crate::db::{Database, JobStore, PreferencesStore};
use crate::format::{initials, posting_period, truncate};
use crate::jobs::api_types::parse_job_list;
use crate::jobs::client::JobsClient;
use crate::jobs::keywords::FilterKeywords;
use crate::jobs::manager::DataManager;
use crate::jobs::repository::JobRepository;
use crate::jobs::types::{DataResponse, FilterOption, Job, ListKind};
use crate::Command;
use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use futures::{pin_mut, Stream, StreamExt};
use std::path::Path;
use std::sync::Arc;

const POSITION_WIDTH: usize = 48;

/// Wires the data layer together and runs one command against it
pub struct App {
  manager: DataManager<JobsClient>,
  client: JobsClient,
}

impl App {
  pub fn new(config: &Config, data_dir: &Path) -> Result<Self> {
    let db_path = data_dir.join("rhino.db");
    let db = Database::open(&db_path)
      .map_err(|e| eyre!("Failed to open database {}: {}", db_path.display(), e))?;
    let db = Arc::new(db);

    let cache = CacheLayer::new(open_cache_storage(config))
      .with_max_age(chrono::Duration::minutes(config.http_cache.max_age_minutes))
      .with_max_size(config.http_cache.max_size_bytes);
    let client = JobsClient::new(&config.api, cache)
      .map_err(|e| eyre!("Failed to create jobs client: {}", e))?;

    let keywords = FilterKeywords::load(config.filter_keywords.as_deref())?;
    let repository = JobRepository::new(
      JobStore::new(db.clone()),
      Arc::new(client.clone()),
      Arc::new(keywords),
    );
    let manager = DataManager::new(repository, PreferencesStore::new(db));

    Ok(Self { manager, client })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::Jobs { refresh } => print_jobs(self.manager.get_all_jobs(refresh)).await,
      Command::Saved => print_jobs(self.manager.get_bookmarked_jobs()).await,
      Command::Search { query, saved } => {
        if saved {
          print_jobs(self.manager.search_bookmarked_jobs(&query)).await
        } else {
          print_jobs(self.manager.search_all_jobs(&query)).await
        }
      }
      Command::Show { id } => self.show_job(&id).await,
      Command::Bookmark { id } => {
        let job = self.manager.toggle_bookmark(&id)?;
        let state = if job.is_bookmarked { "Saved" } else { "Removed" };
        println!("{}: {} @ {}", state, job.position, job.company);
      }
      Command::Sort { list, option } => {
        self.manager.save_sort_option(list, option)?;
        println!("Sorting {} jobs by {}", list_name(list), option);
      }
      Command::Filter { list, option } => {
        self.manager.save_filter_option(list, option)?;
        println!("Showing {} in {} jobs", option, list_name(list));
      }
      Command::Import { file } => {
        let imported = self.import_jobs(&file)?;
        println!("Imported {} jobs from {}", imported, file.display());
      }
      Command::Options => self.print_options()?,
      Command::Purge => {
        let removed = self.manager.clear_jobs()?;
        self.client.clear_cache()?;
        println!("Removed {} stored jobs", removed);
      }
    }
    Ok(())
  }

  async fn show_job(&self, id: &str) {
    let stream = self.manager.get_job_info(id);
    pin_mut!(stream);

    while let Some(response) = stream.next().await {
      if response.show_loading {
        eprintln!("Fetching details...");
        continue;
      }
      if let Some(job) = &response.data {
        println!("{}", render_job_detail(job, Utc::now()));
      }
      report_error(&response);
    }
  }

  /// Store every job in a JSON file shaped like the `GET /jobs` body.
  fn import_jobs(&self, path: &Path) -> Result<usize> {
    let body = std::fs::read(path).map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
    let jobs = parse_job_list(&body)
      .map_err(|e| eyre!("Failed to parse jobs in {}: {}", path.display(), e))?;
    Ok(self.manager.update_jobs(&jobs)?)
  }

  fn print_options(&self) -> Result<()> {
    for list in [ListKind::All, ListKind::Bookmarked] {
      println!(
        "{:<6} sort: {:<14} filter: {}",
        list_name(list),
        self.manager.sort_option(list)?,
        self.manager.filter_option(list)?
      );
    }
    let names: Vec<String> = FilterOption::ALL.iter().map(|o| o.to_string()).collect();
    println!("filters: {}", names.join(", "));
    Ok(())
  }
}

/// Response cache backing the jobs client; disabled or unavailable means no caching.
fn open_cache_storage(config: &Config) -> Arc<dyn CacheStorage> {
  if !config.http_cache.enabled {
    return Arc::new(NoopStorage);
  }

  let Some(path) = SqliteStorage::default_path() else {
    tracing::warn!("no cache directory available, HTTP cache disabled");
    return Arc::new(NoopStorage);
  };

  match SqliteStorage::open(&path) {
    Ok(storage) => Arc::new(storage),
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "failed to open HTTP cache, continuing without it");
      Arc::new(NoopStorage)
    }
  }
}

/// Print every emission of a job list stream as it arrives.
async fn print_jobs(stream: impl Stream<Item = DataResponse<Vec<Job>>>) {
  pin_mut!(stream);
  let now = Utc::now();

  while let Some(response) = stream.next().await {
    if let Some(jobs) = &response.data {
      println!("{}", render_summary(&response, jobs.len()));
      for job in jobs {
        println!("{}", render_job_line(job, now));
      }
    }
    if response.show_loading {
      eprintln!("Refreshing...");
    }
    report_error(&response);
  }
}

fn report_error<T>(response: &DataResponse<T>) {
  if !response.is_error() {
    return;
  }
  if let Some(error) = &response.error {
    tracing::debug!(message = %response.message, error = %error, "response carried an error");
    eprintln!("{}", error.kind().message());
  }
}

fn render_summary<T>(response: &DataResponse<T>, count: usize) -> String {
  let noun = if count == 1 { "job" } else { "jobs" };
  match &response.query {
    Some(query) => format!("{} {} matching \"{}\" ({})", count, noun, query, response.source),
    None => format!("{} {} ({})", count, noun, response.source),
  }
}

fn render_job_line(job: &Job, now: DateTime<Utc>) -> String {
  let marker = if job.is_bookmarked { "*" } else { " " };
  format!(
    "{} {:<12} [{:<2}] {:<width$} {} | {}",
    marker,
    job.id,
    initials(&job.company, 2),
    truncate(&job.position, POSITION_WIDTH),
    job.company,
    posting_period(job.posting_time, now),
    width = POSITION_WIDTH
  )
}

fn render_job_detail(job: &Job, now: DateTime<Utc>) -> String {
  let mut lines = vec![
    format!("{} @ {}", job.position, job.company),
    format!("Posted {}", posting_period(job.posting_time, now)),
  ];
  if !job.tags.is_empty() {
    lines.push(format!("Tags: {}", job.tags.join(", ")));
  }
  if job.is_bookmarked {
    lines.push("Saved".to_string());
  }
  lines.push(job.url.clone());

  if let Some(info) = &job.additional_info {
    lines.push(String::new());
    lines.push(info.job_desc.clone());
    lines.push(String::new());
    lines.push(format!("How to apply: {}", info.apply_instruction));
    lines.push(info.apply_url.clone());
  }

  lines.join("\n")
}

fn list_name(list: ListKind) -> &'static str {
  match list {
    ListKind::All => "all",
    ListKind::Bookmarked => "saved",
  }
}
