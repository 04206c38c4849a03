//! Wire types of the remote drive API.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the implicit drive root
pub const ROOT_ID: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

/// One node of the remote tree, as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,

    #[serde(default)]
    pub parent_id: u64,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    pub name: String,

    /// Byte size, zero for directories
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub depth: u32,

    /// Unix seconds
    #[serde(default)]
    pub last_modified_at: i64,

    /// Unix seconds
    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub added_at: i64,

    #[serde(default)]
    pub updated_at: i64,

    #[serde(default)]
    pub drive_id: u64,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub visibility: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        timestamp(self.last_modified_at)
    }

    /// Short label used by `ls`
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            EntryKind::Dir => "dir",
            EntryKind::File => "file",
        }
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Generic `{ "result": ..., "data": ... }` envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub result: String,
    pub data: T,
}

/// One page of a children listing
#[derive(Debug, Deserialize)]
pub struct ListPage {
    pub result: String,
    #[serde(default)]
    pub data: Vec<Entry>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_predefined: bool,
    #[serde(default)]
    pub created_by: u64,
    #[serde(default)]
    pub created_at: i64,
}

/// Per-file outcome of a category mutation; `result` is false when the
/// file already had (or did not have) the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub id: u64,
    pub result: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileIdsBody<'a> {
    pub file_ids: &'a [u64],
}
