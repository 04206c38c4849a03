//! `stale`: files not modified for a given period.

use super::resolve::{crawl_with_progress, resolve_start};
use super::StaleArgs;
use crate::api::DriveClient;
use crate::report::{parse_age, StaleReport};
use anyhow::Context;
use chrono::Utc;
use std::io::Write;
use tracing::debug;

pub async fn run(client: &DriveClient, args: &StaleArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let threshold_days = parse_age(&args.age).context("invalid --age")?;
    let (start_id, start_name) = resolve_start(client, args.target.as_deref()).await?;
    debug!(start_id, threshold_days, "starting stale scan");

    let entries = crawl_with_progress(client, start_id, &start_name).await?;
    let report = StaleReport::build(&entries, threshold_days, args.min_size, Utc::now());

    report.write_to(out, &args.age, args.top)?;
    Ok(())
}
