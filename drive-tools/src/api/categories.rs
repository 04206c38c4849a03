//! Category (tag) calls.

use super::client::DriveClient;
use super::models::{Category, CategoryResult, FileIdsBody};
use crate::utils::Result;
use bytes::Bytes;
use reqwest::Method;

/// Largest id batch sent in one mutation call
pub const CATEGORY_BATCH_SIZE: usize = 50;

impl DriveClient {
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let path = format!("/2/drive/{}/categories", self.drive_id());
        self.fetch(Method::GET, &path, None).await
    }

    pub async fn add_category(&self, category_id: u64, file_ids: &[u64]) -> Result<Vec<CategoryResult>> {
        self.modify_category(Method::POST, category_id, file_ids).await
    }

    pub async fn remove_category(&self, category_id: u64, file_ids: &[u64]) -> Result<Vec<CategoryResult>> {
        self.modify_category(Method::DELETE, category_id, file_ids).await
    }

    async fn modify_category(
        &self,
        method: Method,
        category_id: u64,
        file_ids: &[u64],
    ) -> Result<Vec<CategoryResult>> {
        let path = format!("/2/drive/{}/files/categories/{}", self.drive_id(), category_id);
        let body = serde_json::to_vec(&FileIdsBody { file_ids })?;
        self.fetch(method, &path, Some(Bytes::from(body))).await
    }
}
