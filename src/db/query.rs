//! Dynamic SQL for job list queries.
//!
//! Sort and filter selections are combined into a single `SELECT` with all
//! user-supplied text bound as parameters.

use crate::jobs::keywords::Keywords;
use crate::jobs::types::SortOption;

/// Columns selected for a full job row, in `JobStore::row_to_job` order.
pub const JOB_COLUMNS: &str = "id, posting_time, company, position, tags, logo, description, url, \
   job_desc, apply_instruction, apply_url, is_bookmarked";

/// Which rows a query considers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  All,
  Bookmarked,
}

/// A job list query with its predicate and ordering
#[derive(Debug, Clone)]
pub struct JobQuery {
  scope: Scope,
  sort: SortOption,
  include: Vec<String>,
  exclude: Vec<String>,
  search: Option<String>,
}

impl JobQuery {
  /// List query narrowed by filter keywords
  pub fn list(scope: Scope, sort: SortOption, keywords: &Keywords) -> Self {
    Self {
      scope,
      sort,
      include: keywords.include.clone(),
      exclude: keywords.exclude.clone(),
      search: None,
    }
  }

  /// Free-text search over position and tags; filter keywords do not apply
  pub fn search(scope: Scope, sort: SortOption, text: &str) -> Self {
    Self {
      scope,
      sort,
      include: Vec::new(),
      exclude: Vec::new(),
      search: Some(text.to_string()),
    }
  }

  /// Render the statement and its positional parameters.
  pub fn to_sql(&self) -> (String, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if self.scope == Scope::Bookmarked {
      clauses.push("is_bookmarked = 1".to_string());
    }

    for keyword in &self.exclude {
      clauses.push("tags NOT LIKE ? ESCAPE '\\'".to_string());
      params.push(like_pattern(keyword));
    }

    if !self.include.is_empty() {
      let group = self
        .include
        .iter()
        .map(|keyword| {
          let pattern = like_pattern(keyword);
          params.push(pattern.clone());
          params.push(pattern);
          "tags LIKE ? ESCAPE '\\' OR position LIKE ? ESCAPE '\\'"
        })
        .collect::<Vec<_>>()
        .join(" OR ");
      clauses.push(format!("({})", group));
    }

    if let Some(text) = &self.search {
      let pattern = like_pattern(text);
      clauses.push("(position LIKE ? ESCAPE '\\' OR tags LIKE ? ESCAPE '\\')".to_string());
      params.push(pattern.clone());
      params.push(pattern);
    }

    let mut sql = format!("SELECT {} FROM jobs", JOB_COLUMNS);
    if !clauses.is_empty() {
      sql.push_str(" WHERE ");
      sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(
      " ORDER BY {} {}, id ASC",
      self.sort.column(),
      if self.sort.is_descending() { "DESC" } else { "ASC" }
    ));

    (sql, params)
  }
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
  let mut pattern = String::with_capacity(text.len() + 2);
  pattern.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}
