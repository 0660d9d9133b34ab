//! Text helpers for printing jobs.

use chrono::{DateTime, Utc};

const SECS_PER_DAY: i64 = 86_400;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Time passed since `posting_time` (epoch millis), e.g. "3 weeks ago".
///
/// Years are 360 days and months 30 days; the largest non-zero unit wins.
pub fn posting_period(posting_time: i64, now: DateTime<Utc>) -> String {
  let elapsed_secs = now.timestamp_millis().saturating_sub(posting_time).max(0) / 1000;
  let days = elapsed_secs / SECS_PER_DAY;

  let (count, unit) = if days >= 360 {
    (days / 360, "year")
  } else if days >= 30 {
    (days / 30, "month")
  } else if days >= 7 {
    (days / 7, "week")
  } else if days > 0 {
    (days, "day")
  } else if elapsed_secs >= 3600 {
    (elapsed_secs / 3600, "hour")
  } else if elapsed_secs >= 60 {
    (elapsed_secs / 60, "minute")
  } else {
    (elapsed_secs, "second")
  };

  let plural = if count == 1 { "" } else { "s" };
  format!("{} {}{} ago", count, unit, plural)
}

/// Up to `limit` capitalised initials of a company name ("GitHub Inc" -> "GHI").
///
/// Words start after whitespace and at every uppercase letter. Blank names give "X".
pub fn initials(company: &str, limit: usize) -> String {
  if company.trim().is_empty() {
    return "X".to_string();
  }

  let mut letters = String::new();
  let mut word_start = true;
  for c in company.trim().chars() {
    if c.is_whitespace() {
      word_start = true;
      continue;
    }
    if word_start || c.is_uppercase() {
      letters.extend(c.to_uppercase());
    }
    word_start = false;
  }

  letters.chars().take(limit).collect()
}
