//! CRUD over the `jobs` table.

use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use std::sync::Arc;

use super::query::{JobQuery, JOB_COLUMNS};
use super::Database;
use crate::error::DataError;
use crate::jobs::types::{Job, JobInfo};

/// Local relational cache of job postings
#[derive(Clone)]
pub struct JobStore {
  db: Arc<Database>,
}

impl JobStore {
  pub fn new(db: Arc<Database>) -> Self {
    Self { db }
  }

  /// Run a list query built from sort/filter/search selections.
  pub fn query(&self, query: &JobQuery) -> Result<Vec<Job>, DataError> {
    let (sql, args) = query.to_sql();
    let conn = self.db.conn()?;
    let mut stmt = conn.prepare(&sql)?;
    let jobs = stmt
      .query_map(params_from_iter(args.iter()), row_to_job)?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(jobs)
  }

  pub fn get_by_id(&self, id: &str) -> Result<Option<Job>, DataError> {
    let conn = self.db.conn()?;
    let job = conn
      .query_row(
        &format!("SELECT {} FROM jobs WHERE id = ? LIMIT 1", JOB_COLUMNS),
        params![id],
        row_to_job,
      )
      .optional()?;
    Ok(job)
  }

  /// Store jobs fetched from the API.
  ///
  /// New ids are inserted; existing rows get their API-owned columns
  /// refreshed while the bookmark flag and fetched details are kept.
  pub fn merge_from_api(&self, jobs: &[Job]) -> Result<usize, DataError> {
    let mut conn = self.db.conn()?;
    let tx = conn.transaction()?;
    let mut changed = 0;
    {
      let mut stmt = tx.prepare(
        "INSERT INTO jobs (id, posting_time, company, position, tags, logo, description, url)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           posting_time = excluded.posting_time,
           company = excluded.company,
           position = excluded.position,
           tags = excluded.tags,
           logo = excluded.logo,
           description = excluded.description,
           url = excluded.url",
      )?;
      for job in jobs {
        changed += stmt.execute(params![
          job.id,
          job.posting_time,
          job.company,
          job.position,
          encode_tags(&job.tags)?,
          job.logo,
          job.description,
          job.url,
        ])?;
      }
    }
    tx.commit()?;
    Ok(changed)
  }

  /// Insert or fully replace jobs, including local state.
  pub fn upsert(&self, jobs: &[Job]) -> Result<usize, DataError> {
    let mut conn = self.db.conn()?;
    let tx = conn.transaction()?;
    let mut changed = 0;
    {
      let mut stmt = tx.prepare(&format!(
        "INSERT OR REPLACE INTO jobs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        JOB_COLUMNS
      ))?;
      for job in jobs {
        let info = job.additional_info.as_ref();
        changed += stmt.execute(params![
          job.id,
          job.posting_time,
          job.company,
          job.position,
          encode_tags(&job.tags)?,
          job.logo,
          job.description,
          job.url,
          info.map(|i| &i.job_desc),
          info.map(|i| &i.apply_instruction),
          info.map(|i| &i.apply_url),
          job.is_bookmarked,
        ])?;
      }
    }
    tx.commit()?;
    Ok(changed)
  }

  /// Delete every job whose id is not in `keep`. Returns the number removed.
  pub fn delete_missing(&self, keep: &[String]) -> Result<usize, DataError> {
    let mut conn = self.db.conn()?;
    let tx = conn.transaction()?;
    tx.execute_batch(
      "CREATE TEMP TABLE IF NOT EXISTS fresh_ids (id TEXT PRIMARY KEY);
       DELETE FROM fresh_ids;",
    )?;
    {
      let mut stmt = tx.prepare("INSERT OR IGNORE INTO fresh_ids (id) VALUES (?)")?;
      for id in keep {
        stmt.execute(params![id])?;
      }
    }
    let removed = tx.execute(
      "DELETE FROM jobs WHERE id NOT IN (SELECT id FROM fresh_ids)",
      [],
    )?;
    tx.execute("DELETE FROM fresh_ids", [])?;
    tx.commit()?;
    Ok(removed)
  }

  /// Attach fetched details to a stored job.
  pub fn set_additional_info(&self, id: &str, info: &JobInfo) -> Result<usize, DataError> {
    let conn = self.db.conn()?;
    let changed = conn.execute(
      "UPDATE jobs SET job_desc = ?, apply_instruction = ?, apply_url = ? WHERE id = ?",
      params![info.job_desc, info.apply_instruction, info.apply_url, id],
    )?;
    Ok(changed)
  }

  pub fn set_bookmarked(&self, id: &str, bookmarked: bool) -> Result<usize, DataError> {
    let conn = self.db.conn()?;
    let changed = conn.execute(
      "UPDATE jobs SET is_bookmarked = ? WHERE id = ?",
      params![bookmarked, id],
    )?;
    Ok(changed)
  }

  pub fn delete_all(&self) -> Result<usize, DataError> {
    let conn = self.db.conn()?;
    Ok(conn.execute("DELETE FROM jobs", [])?)
  }
}

fn encode_tags(tags: &[String]) -> Result<String, DataError> {
  Ok(serde_json::to_string(tags)?)
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<Job> {
  let tags_json: String = row.get(4)?;
  let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
  })?;

  let job_desc: Option<String> = row.get(8)?;
  let apply_instruction: Option<String> = row.get(9)?;
  let apply_url: Option<String> = row.get(10)?;
  // Details only count as fetched when every column is present
  let additional_info = match (job_desc, apply_instruction, apply_url) {
    (Some(job_desc), Some(apply_instruction), Some(apply_url)) => Some(JobInfo {
      job_desc,
      apply_instruction,
      apply_url,
    }),
    _ => None,
  };

  Ok(Job {
    id: row.get(0)?,
    posting_time: row.get(1)?,
    company: row.get(2)?,
    position: row.get(3)?,
    tags,
    logo: row.get(5)?,
    description: row.get(6)?,
    url: row.get(7)?,
    additional_info,
    is_bookmarked: row.get(11)?,
  })
}
