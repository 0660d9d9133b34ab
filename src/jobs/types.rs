use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::DataError;

/// A single remote job posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
  pub id: String,
  /// Epoch milliseconds
  pub posting_time: i64,
  pub company: String,
  pub position: String,
  pub tags: Vec<String>,
  pub logo: Option<String>,
  pub description: String,
  pub url: String,
  pub additional_info: Option<JobInfo>,
  pub is_bookmarked: bool,
}

/// Details fetched on demand for a single job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
  pub job_desc: String,
  pub apply_instruction: String,
  pub apply_url: String,
}

/// Where the data of a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
  /// Fresh network response
  Api,
  /// HTTP response cache, network not touched
  Cache,
  /// Local jobs database
  Db,
}

impl fmt::Display for DataSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      DataSource::Api => "api",
      DataSource::Cache => "cache",
      DataSource::Db => "db",
    };
    f.write_str(name)
  }
}

/// Provenance-tagged result handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct DataResponse<T> {
  pub data: Option<T>,
  pub show_loading: bool,
  pub source: DataSource,
  pub message: String,
  pub error: Option<Arc<DataError>>,
  /// Search text this response answers, if any
  pub query: Option<String>,
}

impl<T> DataResponse<T> {
  pub fn new(data: T, source: DataSource) -> Self {
    Self {
      data: Some(data),
      show_loading: false,
      source,
      message: String::new(),
      error: None,
      query: None,
    }
  }

  /// Response carrying an error and whatever data was last known.
  pub fn failed(
    data: Option<T>,
    source: DataSource,
    message: impl Into<String>,
    error: DataError,
  ) -> Self {
    Self {
      data,
      show_loading: false,
      source,
      message: message.into(),
      error: Some(Arc::new(error)),
      query: None,
    }
  }

  pub fn loading(mut self, show_loading: bool) -> Self {
    self.show_loading = show_loading;
    self
  }

  pub fn with_query(mut self, query: impl Into<String>) -> Self {
    self.query = Some(query.into());
    self
  }

  pub fn is_error(&self) -> bool {
    self.error.is_some()
  }
}

/// Ordering of job lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOption {
  #[default]
  #[value(name = "posting-date")]
  ByPostingDate,
  #[value(name = "position")]
  ByPositionName,
  #[value(name = "company")]
  ByCompanyName,
}

impl SortOption {
  pub fn code(self) -> i64 {
    match self {
      SortOption::ByPostingDate => 0,
      SortOption::ByPositionName => 1,
      SortOption::ByCompanyName => 2,
    }
  }

  /// Unknown codes fall back to posting date.
  pub fn from_code(code: i64) -> Self {
    match code {
      1 => SortOption::ByPositionName,
      2 => SortOption::ByCompanyName,
      _ => SortOption::ByPostingDate,
    }
  }

  /// Column of the jobs table this option orders by
  pub fn column(self) -> &'static str {
    match self {
      SortOption::ByPostingDate => "posting_time",
      SortOption::ByPositionName => "position",
      SortOption::ByCompanyName => "company",
    }
  }

  /// Newest postings first, names alphabetically.
  pub fn is_descending(self) -> bool {
    matches!(self, SortOption::ByPostingDate)
  }

  /// In-memory equivalent of the SQL ordering.
  ///
  /// Text columns compare with SQLite's default BINARY collation, i.e. bytewise.
  pub fn compare(self, a: &Job, b: &Job) -> Ordering {
    let primary = match self {
      SortOption::ByPostingDate => b.posting_time.cmp(&a.posting_time),
      SortOption::ByPositionName => a.position.as_bytes().cmp(b.position.as_bytes()),
      SortOption::ByCompanyName => a.company.as_bytes().cmp(b.company.as_bytes()),
    };
    primary.then_with(|| a.id.cmp(&b.id))
  }
}

impl fmt::Display for SortOption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SortOption::ByPostingDate => "posting date",
      SortOption::ByPositionName => "position name",
      SortOption::ByCompanyName => "company name",
    };
    f.write_str(name)
  }
}

/// Job category used to narrow a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FilterOption {
  #[default]
  AllListings,
  Technical,
  Design,
  Marketing,
  Content,
  Executive,
  Support,
}

impl FilterOption {
  pub const ALL: [FilterOption; 7] = [
    FilterOption::AllListings,
    FilterOption::Technical,
    FilterOption::Design,
    FilterOption::Marketing,
    FilterOption::Content,
    FilterOption::Executive,
    FilterOption::Support,
  ];

  pub fn code(self) -> i64 {
    match self {
      FilterOption::AllListings => 0,
      FilterOption::Technical => 1,
      FilterOption::Design => 2,
      FilterOption::Marketing => 3,
      FilterOption::Content => 4,
      FilterOption::Executive => 5,
      FilterOption::Support => 6,
    }
  }

  /// Unknown codes fall back to all listings.
  pub fn from_code(code: i64) -> Self {
    Self::ALL
      .into_iter()
      .find(|option| option.code() == code)
      .unwrap_or_default()
  }
}

impl fmt::Display for FilterOption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FilterOption::AllListings => "all listings",
      FilterOption::Technical => "technical",
      FilterOption::Design => "design",
      FilterOption::Marketing => "marketing",
      FilterOption::Content => "content",
      FilterOption::Executive => "executive",
      FilterOption::Support => "support",
    };
    f.write_str(name)
  }
}

/// The two job lists that keep their own sort and filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ListKind {
  #[value(name = "all")]
  All,
  #[value(name = "saved")]
  Bookmarked,
}

#[cfg(test)]
pub(crate) fn sample_job(id: &str, posting_time: i64, company: &str, position: &str) -> Job {
  Job {
    id: id.to_string(),
    posting_time,
    company: company.to_string(),
    position: position.to_string(),
    tags: vec!["remote".to_string()],
    logo: None,
    description: format!("{} at {}", position, company),
    url: format!("https://jobs.example.com/{}", id),
    additional_info: None,
    is_bookmarked: false,
  }
}
