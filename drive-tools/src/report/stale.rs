//! Age distribution and stale file listing for `stale`.

use super::format::{format_age_days, format_size, percent, Table};
use crate::api::Entry;
use chrono::{DateTime, Local, TimeDelta, Utc};
use std::io::{self, Write};
use thiserror::Error;

/// (label, lower bound in days inclusive, upper bound exclusive)
const BUCKETS: [(&str, i64, Option<i64>); 6] = [
    ("< 6 months", 0, Some(182)),
    ("6m - 1y", 182, Some(365)),
    ("1 - 2y", 365, Some(730)),
    ("2 - 3y", 730, Some(1095)),
    ("3 - 5y", 1095, Some(1825)),
    ("> 5y", 1825, None),
];

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid age '{0}': expected <number>[y|m|d] (e.g. 2y, 6m, 90d)")]
pub struct InvalidAge(String);

/// Parse `2y`, `6m`, `90d` (also `a` for years and `j` for days) into days.
/// A bare number is read as years. Ages reaching before the earliest
/// representable date are rejected.
pub fn parse_age(age: &str) -> Result<i64, InvalidAge> {
    let invalid = || InvalidAge(age.to_string());

    let split = age.find(|c: char| !c.is_ascii_digit()).unwrap_or(age.len());
    let (digits, unit) = age.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }
    let value: i64 = digits.parse().map_err(|_| invalid())?;

    let factor = match unit {
        "" | "y" | "a" => 365,
        "m" => 30,
        "d" | "j" => 1,
        _ => return Err(invalid()),
    };
    let days = value.checked_mul(factor).ok_or_else(invalid)?;
    TimeDelta::try_days(days)
        .and_then(|delta| Utc::now().checked_sub_signed(delta))
        .ok_or_else(invalid)?;
    Ok(days)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeBucket {
    pub label: &'static str,
    pub count: usize,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFile {
    pub id: u64,
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub age_days: i64,
}

#[derive(Debug)]
pub struct StaleReport {
    pub buckets: Vec<AgeBucket>,
    /// Every stale file, largest first
    pub stale: Vec<StaleFile>,
    pub total_files: usize,
    pub total_size: u64,
}

impl StaleReport {
    /// Classify the files in `entries` relative to `now`.
    ///
    /// A file is stale when it was last modified more than `threshold_days`
    /// ago and is at least `min_size` bytes.
    pub fn build(entries: &[Entry], threshold_days: i64, min_size: u64, now: DateTime<Utc>) -> Self {
        let mut buckets: Vec<AgeBucket> = BUCKETS
            .iter()
            .map(|(label, _, _)| AgeBucket {
                label: *label,
                count: 0,
                size: 0,
            })
            .collect();
        // nothing can be older than the earliest representable date
        let cutoff = TimeDelta::try_days(threshold_days)
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut stale = Vec::new();
        let mut total_files = 0;
        let mut total_size = 0;

        for entry in entries.iter().filter(|e| !e.is_dir()) {
            total_files += 1;
            total_size += entry.size;

            let modified = entry.modified_at();
            let age_days = (now - modified).num_days();

            if let Some(index) = bucket_index(age_days) {
                buckets[index].count += 1;
                buckets[index].size += entry.size;
            }

            if modified < cutoff && entry.size >= min_size {
                stale.push(StaleFile {
                    id: entry.id,
                    name: entry.name.clone(),
                    size: entry.size,
                    modified,
                    age_days,
                });
            }
        }

        stale.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));

        Self {
            buckets,
            stale,
            total_files,
            total_size,
        }
    }

    pub fn stale_size(&self) -> u64 {
        self.stale.iter().map(|f| f.size).sum()
    }

    /// Render the distribution and up to `top` stale files (0 for all)
    pub fn write_to(&self, out: &mut impl Write, age_label: &str, top: usize) -> io::Result<()> {
        writeln!(out, "Age distribution:\n")?;
        let mut table = Table::new(["RANGE", "FILES", "%", "SIZE", "%"]);
        for bucket in &self.buckets {
            table.row([
                bucket.label.to_string(),
                bucket.count.to_string(),
                format!("{:.1}%", percent(bucket.count as u64, self.total_files as u64)),
                format_size(bucket.size),
                format!("{:.1}%", percent(bucket.size, self.total_size)),
            ]);
        }
        table.write_to(out)?;

        writeln!(out, "\nFiles not modified for {}:\n", age_label)?;
        if self.stale.is_empty() {
            return writeln!(out, "No files found");
        }

        let shown = if top > 0 { top.min(self.stale.len()) } else { self.stale.len() };
        let mut table = Table::new(["AGE", "SIZE", "MODIFIED", "ID", "NAME"]);
        for file in &self.stale[..shown] {
            table.row([
                format_age_days(file.age_days),
                format_size(file.size),
                file.modified.with_timezone(&Local).format("%Y-%m-%d").to_string(),
                file.id.to_string(),
                file.name.clone(),
            ]);
        }
        table.write_to(out)?;

        if self.stale.len() > shown {
            writeln!(out, "\n... and {} more files", self.stale.len() - shown)?;
        }

        writeln!(
            out,
            "\nTotal: {} files, {} (of {} files, {})",
            self.stale.len(),
            format_size(self.stale_size()),
            self.total_files,
            format_size(self.total_size)
        )
    }
}

fn bucket_index(age_days: i64) -> Option<usize> {
    BUCKETS.iter().position(|(_, min, max)| {
        age_days >= *min && max.map_or(true, |max| age_days < max)
    })
}
