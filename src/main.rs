mod app;
mod cache;
mod config;
mod db;
mod error;
mod format;
mod jobs;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

use crate::jobs::types::{FilterOption, ListKind, SortOption};

#[derive(Parser, Debug)]
#[command(name = "rhino")]
#[command(about = "Browse, filter and bookmark remote job listings")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rhino/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List all jobs
  Jobs {
    /// Show stored jobs, then fetch fresh ones from the API
    #[arg(short, long)]
    refresh: bool,
  },
  /// List bookmarked jobs
  Saved,
  /// Search job positions and tags
  Search {
    query: String,
    /// Only search bookmarked jobs
    #[arg(short, long)]
    saved: bool,
  },
  /// Show a job with its full description
  Show { id: String },
  /// Toggle the bookmark on a job
  Bookmark { id: String },
  /// Set the sort order of a list
  Sort {
    #[arg(value_enum)]
    list: ListKind,
    #[arg(value_enum)]
    option: SortOption,
  },
  /// Set the category filter of a list
  Filter {
    #[arg(value_enum)]
    list: ListKind,
    #[arg(value_enum)]
    option: FilterOption,
  },
  /// Store jobs from a JSON file in the API list format
  Import { file: PathBuf },
  /// Show the saved sort and filter options
  Options,
  /// Delete stored jobs and cached responses
  Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let data_dir = config.data_dir()?;

  // Held until exit so buffered log lines get flushed
  let _log_guard = init_tracing(&data_dir);

  let app = app::App::new(&config, &data_dir)?;
  app.run(args.command).await?;

  Ok(())
}

/// Log to stderr, and to rhino.log in the data directory when it is writable.
fn init_tracing(data_dir: &Path) -> Option<WorkerGuard> {
  use tracing_subscriber::layer::SubscriberExt;
  use tracing_subscriber::util::SubscriberInitExt;

  let env_filter =
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
  let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

  if let Err(e) = std::fs::create_dir_all(data_dir) {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(stderr_layer)
      .init();
    tracing::warn!(dir = %data_dir.display(), error = %e, "file logging disabled");
    return None;
  }

  let file_appender = tracing_appender::rolling::never(data_dir, "rhino.log");
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(non_blocking)
    .with_ansi(false);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stderr_layer)
    .with(file_layer)
    .init();

  Some(guard)
}
