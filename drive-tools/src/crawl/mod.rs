//! Remote tree traversal.
//!
//! The concurrent [`Crawler`] is the main entry point; [`crawl_sequential`]
//! is the simple depth-first fallback for small trees.

pub mod crawler;
pub mod sequential;

pub use crawler::{Crawler, ProgressFn, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
pub use sequential::crawl_sequential;

use crate::api::{DriveClient, Entry};
use crate::utils::{ApiError, Result};
use std::future::Future;
use std::sync::Arc;

/// Source of directory listings for the crawler
pub trait DirectoryLister: Send + Sync + 'static {
    /// Every direct child of `directory_id`, or an error
    fn list_children(&self, directory_id: u64) -> impl Future<Output = Result<Vec<Entry>>> + Send;
}

impl DirectoryLister for DriveClient {
    fn list_children(&self, directory_id: u64) -> impl Future<Output = Result<Vec<Entry>>> + Send {
        DriveClient::list_children(self, directory_id)
    }
}

/// Pending request to list one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub dir_id: u64,
    pub dir_name: String,
}

impl CrawlJob {
    pub fn new(dir_id: u64, dir_name: impl Into<String>) -> Self {
        Self {
            dir_id,
            dir_name: dir_name.into(),
        }
    }
}

impl From<&Entry> for CrawlJob {
    fn from(entry: &Entry) -> Self {
        Self::new(entry.id, entry.name.clone())
    }
}

/// Outcome of exactly one job
#[derive(Debug)]
pub struct CrawlResult {
    pub dir_name: String,
    pub outcome: std::result::Result<Vec<Entry>, ApiError>,
}

impl DriveClient {
    /// Crawl everything below `root_id` with this client's worker count and
    /// cancellation token.
    pub async fn list_recursive(
        &self,
        root_id: u64,
        root_name: &str,
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<Vec<Entry>> {
        Crawler::new(Arc::new(self.clone()))
            .with_workers(self.workers())
            .with_cancel(self.cancel_token().clone())
            .crawl(root_id, root_name, on_progress)
            .await
    }
}
