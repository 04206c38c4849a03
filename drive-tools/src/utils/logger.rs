//! Logging configuration using tracing.
//!
//! Logs go to stderr so report output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level (`RUST_LOG` wins when set)
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()?;

    Ok(())
}

/// Level used for `--verbose` or the configured default
pub fn level_for(verbose: bool, configured: &str) -> &str {
    if verbose {
        "debug"
    } else {
        configured
    }
}
