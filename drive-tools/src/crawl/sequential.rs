//! Single-task depth-first walk.

use super::DirectoryLister;
use crate::api::Entry;
use crate::utils::{ApiError, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// List every directory below `root_id` one request at a time.
///
/// Produces the same entry set as the concurrent crawler; children of a
/// directory are visited before its later siblings.
pub async fn crawl_sequential<L: DirectoryLister>(
    lister: &L,
    root_id: u64,
    cancel: &CancellationToken,
) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut stack = vec![root_id];

    while let Some(dir_id) = stack.pop() {
        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let children = lister.list_children(dir_id).await?;
        // reversed so the first child is walked first
        stack.extend(children.iter().rev().filter(|c| c.is_dir()).map(|c| c.id));
        entries.extend(children);
    }

    debug!(root_id, entries = entries.len(), "sequential crawl completed");
    Ok(entries)
}
