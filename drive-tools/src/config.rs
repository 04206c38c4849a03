//! Configuration management for drive-tools.
//!
//! Loads configuration from a TOML file with `DRIVE_TOOLS_*` environment
//! variable overrides.

use crate::utils::ConfigError;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.infomaniak.com";
pub const ENV_PREFIX: &str = "DRIVE_TOOLS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Static bearer token
    #[serde(default)]
    pub api_token: String,

    /// Drive the token operates on
    #[serde(default)]
    pub drive_id: u64,

    /// API base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Concurrent crawl workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-attempt HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Token bucket refill rate (requests per second)
    #[serde(default = "default_rate_limit_per_sec")]
    pub rate_limit_per_sec: u32,

    /// Token bucket capacity
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default values
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_workers() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_per_sec() -> u32 {
    10
}

fn default_rate_limit_burst() -> u32 {
    20
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Config {
    /// Configuration with defaults for everything but credentials
    pub fn new(api_token: impl Into<String>, drive_id: u64, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            drive_id,
            base_url: base_url.into(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_per_sec: default_rate_limit_per_sec(),
            rate_limit_burst: default_rate_limit_burst(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from `explicit` (must exist) or the first default
    /// location that exists, then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::MissingFile(path.display().to_string()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => default_config_paths().into_iter().find(|p| p.exists()),
        };

        Self::load_from(file.as_deref(), None)
    }

    /// Load from an optional file plus an environment source.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("log_level", default_log_level())?;

        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "reading config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config.normalized())
    }

    /// Check required values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "api_token required (config or {ENV_PREFIX}_API_TOKEN)"
            )));
        }
        if self.drive_id == 0 {
            return Err(ConfigError::Invalid(format!(
                "drive_id required (config or {ENV_PREFIX}_DRIVE_ID)"
            )));
        }
        if self.workers == 0 || self.workers > 64 {
            return Err(ConfigError::Invalid(format!(
                "workers must be between 1 and 64 (got {})",
                self.workers
            )));
        }
        if self.rate_limit_per_sec == 0 || self.rate_limit_burst == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit_per_sec and rate_limit_burst must be positive".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }
}

/// `~/.config/drive-tools/config.toml`, `~/.drive-tools/config.toml`, `./config.toml`
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        paths.push(home.join(".config").join("drive-tools").join("config.toml"));
        paths.push(home.join(".drive-tools").join("config.toml"));
    }
    paths.push(PathBuf::from("config.toml"));
    paths
}
