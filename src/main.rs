mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod query;
mod task_list;
mod tasks;
mod ui;
mod virtual_list;

use clap::Parser;
use color_eyre::Result;
use config::PaginationDialect;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(about = "A terminal client for a REST task list")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./taskdeck.yaml, then $XDG_CONFIG_HOME/taskdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of the task API, e.g. http://localhost:3000/api
  #[arg(long)]
  api_url: Option<String>,

  /// Pagination parameters the backend understands
  #[arg(long, value_enum)]
  pagination: Option<PaginationDialect>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  if let Some(pagination) = args.pagination {
    config.api.pagination = pagination;
  }

  let _log_guard = logging::init(&config.logging)?;
  info!(
    version = env!("CARGO_PKG_VERSION"),
    api = %config.api.url,
    pagination = ?config.api.pagination,
    "starting taskdeck"
  );

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
