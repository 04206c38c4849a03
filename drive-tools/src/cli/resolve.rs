//! Argument resolution shared by the commands.

use crate::api::{DriveClient, Entry, ROOT_ID};
use crate::report::truncate_name;
use anyhow::{anyhow, Result};
use std::io::{self, Write};
use tracing::debug;

/// Starting directory for a crawl: root, a numeric id or a path
pub async fn resolve_start(client: &DriveClient, arg: Option<&str>) -> Result<(u64, String)> {
    let Some(arg) = arg else {
        return Ok((ROOT_ID, "/".to_string()));
    };

    if let Ok(id) = arg.parse::<u64>() {
        return match client.get_entry(id).await {
            Ok(entry) => Ok((id, entry.name)),
            Err(e) if e.is_cancelled() => Err(e.into()),
            Err(e) => {
                debug!(id, error = %e, "could not fetch start entry, using id as name");
                Ok((id, id.to_string()))
            }
        };
    }

    let entry = client.find_by_path(arg).await?;
    Ok((entry.id, entry.name))
}

/// Numeric id as-is, anything else resolved as a path
pub async fn resolve_file_id(client: &DriveClient, arg: &str) -> Result<u64> {
    if let Ok(id) = arg.parse::<u64>() {
        return Ok(id);
    }
    Ok(client.find_by_path(arg).await?.id)
}

/// Category id and display name from an id or a case-insensitive name
pub async fn resolve_category(client: &DriveClient, name_or_id: &str) -> Result<(u64, String)> {
    if let Ok(id) = name_or_id.parse::<u64>() {
        let name = match client.list_categories().await {
            Ok(categories) => categories
                .into_iter()
                .find(|c| c.id == id)
                .map(|c| c.name)
                .unwrap_or_else(|| id.to_string()),
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(_) => id.to_string(),
        };
        return Ok((id, name));
    }

    let wanted = name_or_id.to_lowercase();
    client
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.name.to_lowercase() == wanted)
        .map(|c| (c.id, c.name))
        .ok_or_else(|| anyhow!("category '{}' not found", name_or_id))
}

/// Crawl below `root_id`, showing a single rewritten progress line on stderr
pub async fn crawl_with_progress(client: &DriveClient, root_id: u64, root_name: &str) -> Result<Vec<Entry>> {
    let mut line = ScanLine::new(io::stderr());
    let mut progress = |dir: &str, found: usize| line.update(dir, found);

    debug!(root_id, root_name, "starting crawl");
    let result = client.list_recursive(root_id, root_name, Some(&mut progress)).await;
    line.finish();
    Ok(result?)
}

/// Single terminal line rewritten in place for every progress update
struct ScanLine<W: Write> {
    out: W,
    drawn: bool,
}

impl<W: Write> ScanLine<W> {
    fn new(out: W) -> Self {
        Self { out, drawn: false }
    }

    fn update(&mut self, dir: &str, found: usize) {
        // progress output is best effort
        let _ = write!(self.out, "\r\x1b[KScanning: {} ({} files found)", truncate_name(dir, 40), found);
        let _ = self.out.flush();
        self.drawn = true;
    }

    /// End the line, if one was drawn at all
    fn finish(&mut self) {
        if self.drawn {
            let _ = writeln!(self.out);
            self.drawn = false;
        }
    }
}
