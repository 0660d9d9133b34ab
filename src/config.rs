use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "RHINO_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub http_cache: HttpCacheConfig,
  /// Directory holding rhino.db and rhino.log (defaults to $XDG_DATA_HOME/rhino)
  pub data_dir: Option<PathBuf>,
  /// JSON file replacing the bundled filter keywords
  pub filter_keywords: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Value sent as the `from` query parameter; empty unless configured
  pub data_source: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://rhino-app.herokuapp.com/v1/".to_string(),
      data_source: String::new(),
      timeout_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpCacheConfig {
  pub enabled: bool,
  pub max_age_minutes: i64,
  pub max_size_bytes: u64,
}

impl Default for HttpCacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_age_minutes: 10,
      max_size_bytes: 10 * 1024 * 1024,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rhino.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rhino/config.yaml
  ///
  /// No file at all means built-in defaults.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => {
        tracing::debug!("no config file found, using defaults");
        Config::default()
      }
    };

    Ok(config.with_env_override(std::env::var(API_URL_ENV).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rhino.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rhino").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  fn with_env_override(mut self, api_url: Option<String>) -> Self {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
      self.api.base_url = url;
    }
    self
  }

  /// Directory for the jobs database and log file.
  pub fn data_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.data_dir {
      return Ok(dir.clone());
    }
    dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local").join("share")))
      .map(|dir| dir.join("rhino"))
      .ok_or_else(|| eyre!("Could not determine a data directory; set data_dir in the config"))
  }
}
