//! `ls`: direct children of one directory.

use super::resolve::resolve_file_id;
use crate::api::{DriveClient, Entry, ROOT_ID};
use crate::report::Table;
use chrono::Local;
use std::io::Write;

pub async fn run(client: &DriveClient, target: Option<&str>, out: &mut impl Write) -> anyhow::Result<()> {
    let directory_id = match target {
        Some(arg) => resolve_file_id(client, arg).await?,
        None => ROOT_ID,
    };

    let mut entries = client.list_children(directory_id).await?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    listing_table(&entries).write_to(out)?;
    Ok(())
}

fn listing_table(entries: &[Entry]) -> Table {
    let mut table = Table::new(["TYPE", "MODIFIED", "ID", "NAME"]);
    for entry in entries {
        table.row([
            entry.kind_label().to_string(),
            entry.modified_at().with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            entry.id.to_string(),
            entry.name.clone(),
        ]);
    }
    table
}
