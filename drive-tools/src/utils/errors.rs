//! Error types for the drive client and crawler.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request timeout after {}s: {method} {path}", timeout.as_secs())]
    TransportTimeout {
        method: String,
        path: String,
        timeout: Duration,
    },

    #[error("API rate limited (429) after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("crawl worker exited before delivering all results")]
    WorkerLost,
}

impl ApiError {
    /// True for `Cancelled`, which callers usually report differently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config read error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("config file not found: {0}")]
    MissingFile(String),

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
