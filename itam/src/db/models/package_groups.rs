//! Database models for package groups.

use crate::api::models::package_groups::{PackageGroupCreate, PackageGroupUpdate};
use crate::types::PackageGroupId;

#[derive(Debug, Clone)]
pub struct PackageGroupCreateDBRequest {
    pub label: String,
}

impl From<PackageGroupCreate> for PackageGroupCreateDBRequest {
    fn from(api: PackageGroupCreate) -> Self {
        Self { label: api.label }
    }
}

#[derive(Debug, Clone)]
pub struct PackageGroupUpdateDBRequest {
    pub label: Option<String>,
}

impl From<PackageGroupUpdate> for PackageGroupUpdateDBRequest {
    fn from(api: PackageGroupUpdate) -> Self {
        Self { label: api.label }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageGroupDBResponse {
    pub id: PackageGroupId,
    pub label: String,
}
