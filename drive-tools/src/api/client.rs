//! Drive API client: single-entry lookups and paginated listings.

use super::models::{ApiResponse, Entry, ListPage, ROOT_ID};
use super::transport::Transport;
use crate::config::Config;
use crate::utils::{ApiError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Explicitly constructed client; clones share one transport and rate limiter.
#[derive(Debug, Clone)]
pub struct DriveClient {
    transport: Arc<Transport>,
    drive_id: u64,
    workers: usize,
}

impl DriveClient {
    /// Create a client with its own cancellation token
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_cancel(config, CancellationToken::new())
    }

    /// Create a client whose requests abort when `cancel` fires
    pub fn with_cancel(config: &Config, cancel: CancellationToken) -> Result<Self> {
        let transport = Transport::from_config(config, cancel)?;
        Ok(Self::from_transport(transport, config.drive_id).with_workers(config.workers))
    }

    pub fn from_transport(transport: Transport, drive_id: u64) -> Self {
        Self {
            transport: Arc::new(transport),
            drive_id,
            workers: 5,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn drive_id(&self) -> u64 {
        self.drive_id
    }

    /// Worker count used by crawls started from this client
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        self.transport.cancel_token()
    }

    /// Fetch one entry by id
    pub async fn get_entry(&self, id: u64) -> Result<Entry> {
        let path = format!("/3/drive/{}/files/{}", self.drive_id, id);
        self.fetch(Method::GET, &path, None).await
    }

    /// List the direct children of a directory, following every page.
    ///
    /// Pages are concatenated in server order. Any failing page aborts the
    /// whole listing; nothing partial is returned.
    pub async fn list_children(&self, directory_id: u64) -> Result<Vec<Entry>> {
        let base = format!("/3/drive/{}/files/{}/files", self.drive_id, directory_id);

        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let path = match &cursor {
                Some(cursor) => format!("{}?cursor={}", base, encode_query_value(cursor)),
                None => base.clone(),
            };

            let data = self.transport.execute(Method::GET, &path, None).await?;
            let page: ListPage = serde_json::from_slice(&data)?;
            if page.result != "success" {
                return Err(ApiError::Api {
                    status: 200,
                    body: page.result,
                });
            }

            pages += 1;
            entries.extend(page.data);

            if !page.has_more {
                break;
            }
            match page.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => {
                    return Err(ApiError::Decode(format!(
                        "listing of {directory_id} has more pages but no cursor"
                    )))
                }
            }
        }

        debug!(directory_id, pages, entries = entries.len(), "listed directory");
        Ok(entries)
    }

    /// Resolve `/A/B/C` from the root, matching names case-insensitively
    pub async fn find_by_path(&self, path: &str) -> Result<Entry> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return self.get_entry(ROOT_ID).await;
        }

        let mut current = ROOT_ID;
        for part in trimmed.split('/').filter(|p| !p.is_empty()) {
            let wanted = part.to_lowercase();
            let children = self.list_children(current).await?;
            current = children
                .iter()
                .find(|child| child.name.to_lowercase() == wanted)
                .map(|child| child.id)
                .ok_or_else(|| ApiError::NotFound(part.to_string()))?;
        }

        self.get_entry(current).await
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<bytes::Bytes>,
    ) -> Result<T> {
        let data = self.transport.execute(method, path, body).await?;
        decode_envelope(&data)
    }
}

/// Decode `{ "result": "success", "data": T }`
pub(crate) fn decode_envelope<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let response: ApiResponse<serde_json::Value> = serde_json::from_slice(data)?;
    if response.result != "success" {
        return Err(ApiError::Api {
            status: 200,
            body: response.result,
        });
    }
    Ok(serde_json::from_value(response.data)?)
}

fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
