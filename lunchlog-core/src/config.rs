//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/lunchlog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/lunchlog/` (~/.config/lunchlog/)
//! - Data: `$XDG_DATA_HOME/lunchlog/` (~/.local/share/lunchlog/)
//! - State/Logs: `$XDG_STATE_HOME/lunchlog/` (~/.local/state/lunchlog/)

use crate::error::{Error, Result};
use crate::types::Location;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_BASE_URL_ENV: &str = "LUNCHLOG_API_BASE_URL";

/// Log files are named `<prefix>.YYYY-MM-DD`, one per UTC day
pub const LOG_FILE_PREFIX: &str = "lunchlog.log";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Which data source to use
    #[serde(default)]
    pub source: SourceConfig,

    /// Remote backend settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Fallback position when none is given on the command line
    #[serde(default)]
    pub location: LocationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data source selection
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
}

/// Supported data sources
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Bundled sample data, history kept in memory
    Fixture,
    /// SQLite store in the XDG data directory
    #[default]
    Local,
    /// REST backend
    Remote,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Fixture => "fixture",
            SourceKind::Local => "local",
            SourceKind::Remote => "remote",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fixture" => Ok(SourceKind::Fixture),
            "local" => Ok(SourceKind::Local),
            "remote" => Ok(SourceKind::Remote),
            _ => Err(format!("unknown source kind: {}", s)),
        }
    }
}

/// REST backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend base URL (e.g., `http://localhost:8000`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures on reads
    #[serde(default = "default_api_max_retries")]
    pub max_retries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
            max_retries: default_api_max_retries(),
        }
    }
}

impl ApiConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must start with http:// or https://, got {:?}",
                url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_api_max_retries() -> usize {
    2
}

/// Default position configuration
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl LocationConfig {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

fn default_latitude() -> f64 {
    Location::DEFAULT.latitude
}

fn default_longitude() -> f64 {
    Location::DEFAULT.longitude
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply environment variable overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_BASE_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(base_url = %url, "api.base_url overridden from environment");
                self.api.base_url = url;
            }
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/lunchlog/config.toml` (~/.config/lunchlog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("lunchlog").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/lunchlog/` (~/.local/share/lunchlog/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("lunchlog")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/lunchlog/` (~/.local/state/lunchlog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("lunchlog")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/lunchlog/lunchlog.db` (~/.local/share/lunchlog/lunchlog.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("lunchlog.db")
    }

    /// Returns the log file written on `date`
    ///
    /// `$XDG_STATE_HOME/lunchlog/lunchlog.log.YYYY-MM-DD`
    pub fn log_path(date: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!("{}.{}", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.kind, SourceKind::Local);
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.location.latitude, 37.5665);
        assert_eq!(config.location.longitude, 126.9780);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[source]
kind = "remote"

[api]
base_url = "https://lunch.example.com/"
timeout_secs = 3

[location]
latitude = 37.4979
longitude = 127.0276

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.source.kind, SourceKind::Remote);
        assert_eq!(config.api.base_url(), "https://lunch.example.com");
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.location.location().latitude, 37.4979);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let toml = r#"
[source]
kind = "cloud"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
        assert!("cloud".parse::<SourceKind>().is_err());
        assert_eq!("fixture".parse::<SourceKind>(), Ok(SourceKind::Fixture));
    }

    #[test]
    fn test_api_config_validation() {
        assert!(ApiConfig::default().validate().is_ok());

        let config = ApiConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ApiConfig {
            base_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source]\nkind = \"fixture\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.source.kind, SourceKind::Fixture);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from(&missing),
            Err(Error::Config(_))
        ));
    }
}
