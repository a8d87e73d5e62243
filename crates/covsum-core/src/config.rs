//! Configuration management for covsum.
//!
//! Loads configuration from ${COVSUM_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ExportFormat, ExportSelection};

/// Environment variable overriding the backend URL.
pub const BASE_URL_ENV: &str = "COVSUM_BASE_URL";

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for covsum configuration.
    //!
    //! COVSUM_HOME resolution order:
    //! 1. COVSUM_HOME environment variable (if set)
    //! 2. ~/.config/covsum (default)

    use std::path::PathBuf;

    /// Returns the covsum home directory.
    pub fn covsum_home() -> PathBuf {
        if let Ok(home) = std::env::var("COVSUM_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".covsum"),
            |h| h.join(".config").join("covsum"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        covsum_home().join("config.toml")
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    /// JSON lines on stderr
    pub json: bool,
    /// Optional log file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: Option<String>,

    /// Timeout for non-streaming requests in seconds (0 disables)
    pub request_timeout_secs: u64,

    /// Delay before the direct result fetch after a stream failure
    pub fallback_delay_ms: u64,

    /// Quiet period after which keepalives escalate the activity indicator
    pub activity_stale_secs: u64,

    /// Export formats checked by default
    pub default_export: Vec<ExportFormat>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
            fallback_delay_ms: Self::DEFAULT_FALLBACK_DELAY_MS,
            activity_stale_secs: Self::DEFAULT_ACTIVITY_STALE_SECS,
            default_export: vec![ExportFormat::Md],
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    const DEFAULT_FALLBACK_DELAY_MS: u64 = 1000;
    const DEFAULT_ACTIVITY_STALE_SECS: u64 = 10;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Resolves the backend URL with precedence: flag > env > config > default.
    ///
    /// # Errors
    /// Returns an error if the chosen URL is malformed.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<String> {
        let env_url = std::env::var(BASE_URL_ENV).ok();
        let candidates = [flag, env_url.as_deref(), self.base_url.as_deref()];

        for candidate in candidates.into_iter().flatten() {
            let trimmed = candidate.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }

    /// `None` disables the timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn activity_stale(&self) -> Duration {
        Duration::from_secs(self.activity_stale_secs)
    }

    pub fn default_exports(&self) -> ExportSelection {
        ExportSelection::from_formats(&self.default_export)
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid backend base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fallback_delay(), Duration::from_millis(1000));
        assert_eq!(config.activity_stale(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "base_url = \"http://summarizer:9000\"\ndefault_export = [\"md\", \"pdf\"]\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://summarizer:9000"));
        assert_eq!(config.request_timeout_secs, 60);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.default_exports(), ExportSelection { md: true, pdf: true });
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "fallback_delay_ms = \"soon\"").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# base_url ="));
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_flag_wins_over_config() {
        let config = Config {
            base_url: Some("http://from-config:1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_base_url(Some("http://from-flag:2")).unwrap(),
            "http://from-flag:2"
        );
    }

    #[test]
    fn test_invalid_flag_url_is_rejected() {
        let config = Config::default();
        assert!(config.resolve_base_url(Some("not a url")).is_err());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), None);
    }
}
