//! `tag`: list, add and remove categories.

use super::resolve::{crawl_with_progress, resolve_category, resolve_file_id};
use super::TagArgs;
use crate::api::{CategoryResult, DriveClient, CATEGORY_BATCH_SIZE};
use crate::report::{hex_to_ansi, truncate_name};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    Add,
    Remove,
}

impl TagMode {
    fn verb(self) -> &'static str {
        match self {
            TagMode::Add => "Adding",
            TagMode::Remove => "Removing",
        }
    }
}

/// Counts reported after a tag mutation
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagSummary {
    pub changed: usize,
    pub skipped: usize,
}

pub async fn list(client: &DriveClient, out: &mut impl Write) -> anyhow::Result<()> {
    for category in client.list_categories().await? {
        writeln!(
            out,
            "{}\t{} {}\t{}",
            category.id,
            hex_to_ansi(&category.color),
            category.color,
            category.name
        )?;
    }
    Ok(())
}

pub async fn apply(client: &DriveClient, args: &TagArgs, mode: TagMode) -> anyhow::Result<()> {
    let summary = tag_files(client, args, mode).await?;
    match mode {
        TagMode::Add => eprintln!(
            "Done: {} tagged, {} skipped (already tagged)",
            summary.changed, summary.skipped
        ),
        TagMode::Remove => eprintln!(
            "Done: {} untagged, {} skipped (not tagged)",
            summary.changed, summary.skipped
        ),
    }
    Ok(())
}

/// Resolve the category and the target, then mutate in batches
pub async fn tag_files(client: &DriveClient, args: &TagArgs, mode: TagMode) -> anyhow::Result<TagSummary> {
    let (category_id, category_name) = resolve_category(client, &args.category).await?;
    let file_id = resolve_file_id(client, &args.target).await?;
    let files = collect_files(client, file_id, args.recursive).await?;
    debug!(category_id, files = files.len(), ?mode, "applying category");

    let ids: Vec<u64> = files.iter().map(|(id, _)| *id).collect();
    let names: HashMap<u64, String> = files.into_iter().collect();

    let bar = progress_bar(ids.len() as u64, format!("{} [{}]", mode.verb(), category_name))?;
    let mut summary = TagSummary::default();

    for batch in ids.chunks(CATEGORY_BATCH_SIZE) {
        let results: Vec<CategoryResult> = match mode {
            TagMode::Add => client.add_category(category_id, batch).await,
            TagMode::Remove => client.remove_category(category_id, batch).await,
        }
        .inspect_err(|_| bar.abandon())?;

        for result in results {
            if let Some(name) = names.get(&result.id) {
                bar.set_message(truncate_name(name, 30));
            }
            bar.inc(1);
            if result.result {
                summary.changed += 1;
            } else {
                summary.skipped += 1;
            }
        }
    }

    bar.finish_and_clear();
    Ok(summary)
}

/// The target itself, plus every descendant when `recursive`
async fn collect_files(client: &DriveClient, file_id: u64, recursive: bool) -> anyhow::Result<Vec<(u64, String)>> {
    let root = client.get_entry(file_id).await?;
    let mut files = vec![(root.id, root.name.clone())];

    if recursive {
        let children = crawl_with_progress(client, root.id, &root.name).await?;
        files.extend(children.into_iter().map(|e| (e.id, e.name)));
    }
    Ok(files)
}

fn progress_bar(total: u64, prefix: String) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
    bar.set_style(
        ProgressStyle::with_template("{prefix} [{bar:40.green}] {pos}/{len} {msg}")?.progress_chars("=> "),
    );
    bar.set_prefix(prefix);
    Ok(bar)
}
