//! Utility modules shared by the client, crawler and CLI.

pub mod errors;
pub mod logger;

pub use errors::{ApiError, ConfigError, Result};
