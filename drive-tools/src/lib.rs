//! Drive Tools Library
//!
//! Client, concurrent crawler and reports for large remote drives served
//! through a rate-limited HTTP API.

pub mod api;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod report;
pub mod shutdown;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use api::{DriveClient, Entry, Transport};
pub use config::Config;
pub use crawl::{crawl_sequential, Crawler, DirectoryLister};
pub use utils::errors::ApiError;
pub type Result<T> = std::result::Result<T, ApiError>;
