//! Command-line interface.

pub mod ls;
pub mod resolve;
pub mod scan;
pub mod stale;
pub mod tag;

use crate::api::DriveClient;
use crate::config::Config;
use crate::report::SortKey;
use crate::shutdown::ShutdownCoordinator;
use crate::utils::logger;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drive-tools", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Concurrent crawl workers (overrides config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the direct children of a directory
    Ls {
        /// Directory id or path, root when omitted
        target: Option<String>,
    },

    /// Find directories holding many files
    Scan(ScanArgs),

    /// Find old files for retention review
    Stale(StaleArgs),

    /// Manage categories
    Tag {
        #[command(subcommand)]
        action: TagCommand,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory id or path, root when omitted
    pub target: Option<String>,

    /// Show top N directories (0 = unlimited)
    #[arg(short = 'n', long, default_value_t = 10)]
    pub top: usize,

    /// Minimum file count
    #[arg(short, long, default_value_t = 100)]
    pub threshold: usize,

    /// Show every directory with files, unfiltered
    #[arg(short, long)]
    pub all: bool,

    #[arg(short, long, value_enum, default_value_t = SortKey::Size)]
    pub sort: SortKey,
}

#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Directory id or path, root when omitted
    pub target: Option<String>,

    /// Minimum age (e.g. 2y, 6m, 90d)
    #[arg(short, long, default_value = "2y")]
    pub age: String,

    /// Show top N files (0 = unlimited)
    #[arg(short = 'n', long, default_value_t = 20)]
    pub top: usize,

    /// Minimum file size in bytes
    #[arg(short, long, default_value_t = 0)]
    pub min_size: u64,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// List available categories
    List,
    /// Add a category to a file or directory
    Add(TagArgs),
    /// Remove a category from a file or directory
    Rm(TagArgs),
}

#[derive(Args, Debug)]
pub struct TagArgs {
    /// Category name or id
    pub category: String,

    /// File id or path
    pub target: String,

    /// Apply to every descendant as well
    #[arg(short, long)]
    pub recursive: bool,
}

/// Load configuration, start logging and run the selected command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    logger::init(logger::level_for(cli.verbose, &config.log_level))?;
    config.validate()?;

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        drive_id = config.drive_id,
        workers = config.workers,
        "starting"
    );

    let shutdown = ShutdownCoordinator::new();
    let listener = shutdown.listen();
    let client = DriveClient::with_cancel(&config, shutdown.token())?;

    let mut out = io::stdout();
    let result = match cli.command {
        Command::Ls { target } => ls::run(&client, target.as_deref(), &mut out).await,
        Command::Scan(args) => scan::run(&client, &args, &mut out).await,
        Command::Stale(args) => stale::run(&client, &args, &mut out).await,
        Command::Tag { action } => match action {
            TagCommand::List => tag::list(&client, &mut out).await,
            TagCommand::Add(args) => tag::apply(&client, &args, tag::TagMode::Add).await,
            TagCommand::Rm(args) => tag::apply(&client, &args, tag::TagMode::Remove).await,
        },
    };

    listener.abort();
    result
}
