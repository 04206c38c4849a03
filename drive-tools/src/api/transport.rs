//! Reliable request transport.
//!
//! Every call goes through the client's token bucket, carries the bearer
//! token, is bounded by a per-attempt timeout and retries HTTP 429 with
//! exponential backoff. Any other status >= 400 fails immediately.

use super::rate_limit::RateLimiter;
use crate::config::Config;
use crate::utils::{ApiError, Result};
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry behavior for rate-limited (429) responses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    /// Wait after the first 429; doubles for each following one.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Backoff after the given zero-based attempt: 1s, 2s, 4s, ...
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// HTTP transport owning its rate limiter.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    token: String,
    limiter: RateLimiter,
    timeout: Duration,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Transport {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        limiter: RateLimiter,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("drive-tools/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http,
            base_url,
            token: token.into(),
            limiter,
            timeout,
            retry: RetryPolicy::default(),
            cancel,
        })
    }

    pub fn from_config(config: &Config, cancel: CancellationToken) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.api_token.clone(),
            RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst),
            config.request_timeout(),
            cancel,
        )
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Issue one logical request and return the raw response body.
    ///
    /// `path` is appended to the base URL and may carry a query string.
    pub async fn execute(&self, method: Method, path: &str, body: Option<Bytes>) -> Result<Bytes> {
        let url = format!("{}{}", self.base_url, path);
        let max_attempts = self.retry.max_attempts;

        for attempt in 0..max_attempts {
            debug!(method = %method, path, "waiting for rate limiter");
            self.limiter.acquire(&self.cancel).await?;
            debug!(method = %method, path, attempt = attempt + 1, "sending request");

            let (status, data) = self.send_once(&method, &url, path, body.clone()).await?;

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt + 1 < max_attempts {
                    let delay = self.retry.backoff_duration(attempt);
                    warn!(
                        method = %method,
                        path,
                        attempt = attempt + 1,
                        backoff_ms = delay.as_millis() as u64,
                        "rate limited by server, backing off"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    continue;
                }
                return Err(ApiError::RateLimited {
                    attempts: max_attempts,
                });
            }

            if status.as_u16() >= 400 {
                return Err(ApiError::Api {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&data).into_owned(),
                });
            }

            return Ok(data);
        }

        Err(ApiError::RateLimited {
            attempts: max_attempts,
        })
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<(StatusCode, Bytes)> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        let attempt = async {
            let response = request.send().await?;
            let status = response.status();
            let data = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, data))
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, attempt) => match outcome {
                Ok(Ok(pair)) => Ok(pair),
                Ok(Err(e)) if e.is_timeout() => Err(self.timeout_error(method, path)),
                Ok(Err(e)) => Err(ApiError::Http(e)),
                Err(_) => Err(self.timeout_error(method, path)),
            },
        }
    }

    fn timeout_error(&self, method: &Method, path: &str) -> ApiError {
        ApiError::TransportTimeout {
            method: method.to_string(),
            path: path.to_string(),
            timeout: self.timeout,
        }
    }
}
