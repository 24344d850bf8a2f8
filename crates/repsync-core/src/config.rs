//! Configuration types for Repsync components.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Default Wger API base URL used when no sources file overrides it.
pub const DEFAULT_WGER_BASE_URL: &str = "https://wger.de/api/v2";

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Import/sync run configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Page size used to approximate "fetch all" when building the
    /// identity index.
    pub list_limit: i64,
    /// Cap on the per-row error list in a run report.
    pub max_report_errors: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            list_limit: 10_000,
            max_report_errors: crate::sync::MAX_REPORT_ERRORS,
        }
    }
}

/// External source configuration, loadable from a `sources.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub wger: WgerSourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wger: WgerSourceConfig::default(),
        }
    }
}

/// Wger API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WgerSourceConfig {
    pub base_url: String,
}

impl Default for WgerSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WGER_BASE_URL.to_string(),
        }
    }
}

/// Default location of the sources file: `<config dir>/repsync/sources.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("repsync").join("sources.toml"))
}

/// Loads the sources configuration.
///
/// A missing file is not an error: defaults apply. A file that exists but
/// cannot be read or parsed is reported as [`AppError::ConfigError`].
pub fn load_sources_config(path: Option<&Path>) -> Result<SourcesConfig, AppError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(SourcesConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(SourcesConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| AppError::ConfigError(format!("cannot read {}: {}", path.display(), e)))?;

    toml::from_str(&contents)
        .map_err(|e| AppError::ConfigError(format!("cannot parse {}: {}", path.display(), e)))
}
