use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub list: ListConfig,
  pub logging: LoggingConfig,
  /// Custom title for header (defaults to "taskdeck")
  pub title: Option<String>,
}

/// Which query parameters the backend understands for pagination.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaginationDialect {
  /// `_start` / `_limit`
  #[default]
  Offset,
  /// `_page` / `_limit`, 1-based pages
  Page,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL the `/tasks` collection lives under
  pub url: String,
  pub pagination: PaginationDialect,
  pub page_size: usize,
  /// Field to sort the list by; empty disables sorting parameters
  pub sort_field: String,
  pub sort_order: SortOrder,
  pub timeout_secs: u64,
  /// Placeholder owner for created tasks
  pub user_id: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:3000/api".to_string(),
      pagination: PaginationDialect::Offset,
      page_size: 20,
      sort_field: "id".to_string(),
      sort_order: SortOrder::Desc,
      timeout_secs: 10,
      user_id: 1,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds after which a cached result counts as stale
  pub stale_secs: u64,
  /// Seconds an unobserved entry survives before garbage collection
  pub gc_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: 0,
      gc_secs: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListConfig {
  /// Rows rendered beyond each edge of the viewport
  pub overscan: usize,
  /// Fetch the next page this many rows before the loader row is reached
  pub prefetch_rows: usize,
  /// Estimated card height in terminal rows
  pub row_height: f64,
  /// Card height below `compact_breakpoint` columns, where text wraps more
  pub compact_row_height: f64,
  pub compact_breakpoint: u16,
}

impl Default for ListConfig {
  fn default() -> Self {
    Self {
      overscan: 5,
      prefetch_rows: 0,
      row_height: 4.0,
      compact_row_height: 5.0,
      compact_breakpoint: 80,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Default filter directive when RUST_LOG is unset
  pub level: String,
  /// Log directory (defaults to the platform data dir)
  pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl LoggingConfig {
  pub fn log_dir(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.dir {
      return Ok(dir.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("taskdeck").join("logs"))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./taskdeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/taskdeck/config.yaml
  ///
  /// Without any file the defaults are used. `TASKDECK_API_URL` overrides
  /// the API url from the file.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Some(url) = Self::api_url_from_env() {
      config.api.url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("taskdeck.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("taskdeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    info!(path = %path.display(), "loaded config");
    Ok(config)
  }

  /// Get the API url override from the environment.
  fn api_url_from_env() -> Option<String> {
    std::env::var("TASKDECK_API_URL")
      .ok()
      .filter(|v| !v.trim().is_empty())
  }

  pub fn validate(&self) -> Result<()> {
    if self.api.page_size == 0 {
      return Err(eyre!("api.page_size must be at least 1"));
    }
    if self.list.row_height <= 0.0 || self.list.compact_row_height <= 0.0 {
      return Err(eyre!("list row heights must be positive"));
    }
    Ok(())
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("taskdeck")
  }
}
