//! Include/exclude keyword sets behind each filter option.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::Path;

use super::types::{FilterOption, Job};

const BUNDLED_KEYWORDS: &str = include_str!("../../assets/filter_keywords.json");

/// Keyword sets for every filter option
#[derive(Debug, Clone, Deserialize)]
pub struct FilterKeywords {
  pub all: Keywords,
  pub technical: Keywords,
  pub design: Keywords,
  pub marketing: Keywords,
  pub content: Keywords,
  pub executive: Keywords,
  pub support: Keywords,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Keywords {
  pub name: String,
  #[serde(default)]
  pub include: Vec<String>,
  #[serde(default)]
  pub exclude: Vec<String>,
}

impl FilterKeywords {
  /// Keywords shipped with the binary.
  pub fn bundled() -> Result<Self> {
    serde_json::from_str(BUNDLED_KEYWORDS)
      .map_err(|e| eyre!("Failed to parse bundled filter keywords: {}", e))
  }

  /// Load keywords from `path`, or the bundled set when no path is given.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Self::bundled();
    };

    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read filter keywords {}: {}", path.display(), e))?;

    serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse filter keywords {}: {}", path.display(), e))
  }

  pub fn for_option(&self, option: FilterOption) -> &Keywords {
    match option {
      FilterOption::AllListings => &self.all,
      FilterOption::Technical => &self.technical,
      FilterOption::Design => &self.design,
      FilterOption::Marketing => &self.marketing,
      FilterOption::Content => &self.content,
      FilterOption::Executive => &self.executive,
      FilterOption::Support => &self.support,
    }
  }
}

impl Keywords {
  pub fn is_empty(&self) -> bool {
    self.include.is_empty() && self.exclude.is_empty()
  }

  /// In-memory equivalent of the SQL filter predicate.
  ///
  /// Mirrors SQLite `LIKE`: ASCII case-insensitive substring match against
  /// the JSON-encoded tag list (and the position for include keywords).
  pub fn matches(&self, job: &Job) -> bool {
    let tags = serde_json::to_string(&job.tags)
      .unwrap_or_default()
      .to_ascii_lowercase();
    let position = job.position.to_ascii_lowercase();

    let excluded = self
      .exclude
      .iter()
      .map(|k| k.to_ascii_lowercase())
      .any(|k| tags.contains(&k));
    if excluded {
      return false;
    }

    if self.include.is_empty() {
      return true;
    }

    self
      .include
      .iter()
      .map(|k| k.to_ascii_lowercase())
      .any(|k| tags.contains(&k) || position.contains(&k))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::jobs::types::sample_job;
  use std::io::Write;

  #[test]
  fn test_bundled_keywords_parse() {
    let keywords = FilterKeywords::bundled().unwrap();
    assert!(keywords.for_option(FilterOption::AllListings).is_empty());
    assert!(!keywords.for_option(FilterOption::Technical).include.is_empty());
  }

  #[test]
  fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = r#"{
      "all": {"name": "All", "include": [], "exclude": []},
      "technical": {"name": "Tech", "include": ["rust"], "exclude": []},
      "design": {"name": "Design", "include": [], "exclude": []},
      "marketing": {"name": "Marketing", "include": [], "exclude": []},
      "content": {"name": "Content", "include": [], "exclude": []},
      "executive": {"name": "Exec", "include": [], "exclude": []},
      "support": {"name": "Support"}
    }"#;
    file.write_all(json.as_bytes()).unwrap();

    let keywords = FilterKeywords::load(Some(file.path())).unwrap();
    assert_eq!(keywords.for_option(FilterOption::Technical).include, vec!["rust"]);
    assert!(keywords.for_option(FilterOption::Support).is_empty());
  }

  #[test]
  fn test_load_missing_file_fails() {
    assert!(FilterKeywords::load(Some(Path::new("/definitely/not/here.json"))).is_err());
  }

  #[test]
  fn test_matches_include_on_tags_or_position() {
    let keywords = Keywords {
      name: "Tech".into(),
      include: vec!["Rust".into()],
      exclude: vec![],
    };
    let by_position = sample_job("a", 1, "Acme", "Senior RUST developer");
    let mut by_tag = sample_job("b", 1, "Acme", "Engineer");
    by_tag.tags = vec!["rust".into()];
    let other = sample_job("c", 1, "Acme", "Writer");

    assert!(keywords.matches(&by_position));
    assert!(keywords.matches(&by_tag));
    assert!(!keywords.matches(&other));
  }

  #[test]
  fn test_matches_exclude_only_checks_tags() {
    let keywords = Keywords {
      name: "Support".into(),
      include: vec![],
      exclude: vec!["engineer".into()],
    };
    let mut tagged = sample_job("a", 1, "Acme", "Support");
    tagged.tags = vec!["Engineering".into()];
    let titled = sample_job("b", 1, "Acme", "Support Engineer");

    assert!(!keywords.matches(&tagged));
    assert!(keywords.matches(&titled));
  }
}
