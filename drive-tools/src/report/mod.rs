//! Report building and rendering for the CLI commands.
//!
//! Reports are computed from a crawled entry list and written to any
//! `io::Write`, so stdout stays the only place output goes.

pub mod format;
pub mod scan;
pub mod stale;

pub use format::{format_age_days, format_size, hex_to_ansi, truncate_name, Table};
pub use scan::{DirStats, ScanOptions, ScanReport, SortKey};
pub use stale::{parse_age, StaleReport};
