//! Client for the remote drive HTTP API.

pub mod categories;
pub mod client;
pub mod models;
pub mod rate_limit;
pub mod transport;

pub use categories::CATEGORY_BATCH_SIZE;
pub use client::DriveClient;
pub use models::{Category, CategoryResult, Entry, EntryKind, ROOT_ID};
pub use rate_limit::RateLimiter;
pub use transport::{RetryPolicy, Transport};
