//! Per-directory file counts for `scan`.

use super::format::{format_size, percent, Table};
use crate::api::Entry;
use clap::ValueEnum;
use std::collections::HashMap;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    #[default]
    Size,
    Files,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Row limit, 0 for unlimited
    pub top: usize,
    /// Minimum direct file count for a directory to be listed
    pub threshold: usize,
    /// Skip threshold and limit
    pub all: bool,
    pub sort: SortKey,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            top: 10,
            threshold: 100,
            all: false,
            sort: SortKey::Size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirStats {
    pub id: u64,
    pub name: String,
    pub file_count: usize,
    pub size: u64,
}

#[derive(Debug)]
pub struct ScanReport {
    pub rows: Vec<DirStats>,
    pub total_files: usize,
    pub total_dirs: usize,
    pub total_size: u64,
    /// Set when nothing met the threshold and the top directories are shown instead
    pub fallback_notice: Option<String>,
}

impl ScanReport {
    /// Aggregate direct files per parent directory, the crawl root included
    pub fn build(entries: &[Entry], root_id: u64, root_name: &str, options: &ScanOptions) -> Self {
        let mut stats: HashMap<u64, DirStats> = entries
            .iter()
            .filter(|e| e.is_dir())
            .map(|e| (e.id, DirStats::new(e.id, &e.name)))
            .collect();
        stats.insert(root_id, DirStats::new(root_id, root_name));

        let mut total_files = 0;
        let mut total_dirs = 0;
        let mut total_size = 0;
        for entry in entries {
            if entry.is_dir() {
                total_dirs += 1;
                continue;
            }
            total_files += 1;
            total_size += entry.size;
            if let Some(parent) = stats.get_mut(&entry.parent_id) {
                parent.file_count += 1;
                parent.size += entry.size;
            }
        }

        let mut results: Vec<DirStats> = stats.into_values().filter(|s| s.file_count > 0).collect();
        match options.sort {
            SortKey::Size => results.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id))),
            SortKey::Files => {
                results.sort_by(|a, b| b.file_count.cmp(&a.file_count).then(a.id.cmp(&b.id)))
            }
        }

        let (rows, fallback_notice) = select_rows(results, options);
        Self {
            rows,
            total_files,
            total_dirs,
            total_size,
            fallback_notice,
        }
    }

    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        if self.rows.is_empty() {
            return writeln!(out, "No directories found");
        }

        let mut table = Table::new(["FILES", "SIZE", "%", "ID", "NAME"]);
        for row in &self.rows {
            table.row([
                row.file_count.to_string(),
                format_size(row.size),
                format!("{:.1}%", percent(row.size, self.total_size)),
                row.id.to_string(),
                row.name.clone(),
            ]);
        }
        table.write_to(out)?;

        writeln!(
            out,
            "\nTotal: {} files, {} directories, {}",
            self.total_files,
            self.total_dirs,
            format_size(self.total_size)
        )
    }
}

impl DirStats {
    fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            file_count: 0,
            size: 0,
        }
    }
}

fn select_rows(results: Vec<DirStats>, options: &ScanOptions) -> (Vec<DirStats>, Option<String>) {
    if options.all {
        return (results, None);
    }

    let limit = |mut rows: Vec<DirStats>| {
        if options.top > 0 {
            rows.truncate(options.top);
        }
        rows
    };

    let passing: Vec<DirStats> = results
        .iter()
        .filter(|r| r.file_count >= options.threshold)
        .cloned()
        .collect();

    if passing.is_empty() && !results.is_empty() {
        let rows = limit(results);
        let notice = format!(
            "No directories with >= {} files, showing top {}:",
            options.threshold,
            rows.len()
        );
        return (rows, Some(notice));
    }

    (limit(passing), None)
}
