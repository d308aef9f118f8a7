//! API models for uploaded deployment files.

use crate::db::models::file_storage::StoredFile;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl From<StoredFile> for FileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            name: file.name,
            size: file.size,
        }
    }
}

