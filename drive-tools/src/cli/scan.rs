//! `scan`: directories holding many files.

use super::resolve::{crawl_with_progress, resolve_start};
use super::ScanArgs;
use crate::api::DriveClient;
use crate::report::{ScanOptions, ScanReport};
use std::io::Write;
use tracing::debug;

pub async fn run(client: &DriveClient, args: &ScanArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let (start_id, start_name) = resolve_start(client, args.target.as_deref()).await?;
    let entries = crawl_with_progress(client, start_id, &start_name).await?;
    debug!(start_id, entries = entries.len(), "scan crawl finished");

    let options = ScanOptions {
        top: args.top,
        threshold: args.threshold,
        all: args.all,
        sort: args.sort,
    };
    let report = ScanReport::build(&entries, start_id, &start_name, &options);
    if let Some(notice) = &report.fallback_notice {
        eprintln!("{}", notice);
    }

    report.write_to(out)?;
    Ok(())
}
