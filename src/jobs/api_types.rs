//! Serde-deserializable types matching the jobs API responses.
//!
//! These types are separate from domain types so local-only state
//! (bookmarks, fetched details) never leaks into deserialization.

use serde::{Deserialize, Deserializer};

use super::types::{Job, JobInfo};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiJob {
  pub id: String,
  pub posting_time: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub company: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub position: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tags: Vec<String>,
  pub logo: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiJobInfo {
  #[serde(default, deserialize_with = "null_as_default")]
  pub job_desc: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub apply_instruction: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub apply_url: String,
}

/// Missing and `null` fields both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<ApiJob> for Job {
  fn from(api: ApiJob) -> Self {
    Job {
      id: api.id,
      posting_time: api.posting_time,
      company: api.company,
      position: api.position,
      tags: api.tags,
      logo: api.logo.filter(|logo| !logo.is_empty()),
      description: api.description,
      url: api.url,
      additional_info: None,
      is_bookmarked: false,
    }
  }
}

impl From<ApiJobInfo> for JobInfo {
  fn from(api: ApiJobInfo) -> Self {
    JobInfo {
      job_desc: api.job_desc,
      apply_instruction: api.apply_instruction,
      apply_url: api.apply_url,
    }
  }
}

/// Decode a `GET /jobs` body.
pub fn parse_job_list(body: &[u8]) -> serde_json::Result<Vec<Job>> {
  let jobs: Vec<ApiJob> = serde_json::from_slice(body)?;
  Ok(jobs.into_iter().map(Job::from).collect())
}

/// Decode a `GET /job` body.
pub fn parse_job_info(body: &[u8]) -> serde_json::Result<JobInfo> {
  let info: ApiJobInfo = serde_json::from_slice(body)?;
  Ok(info.into())
}
