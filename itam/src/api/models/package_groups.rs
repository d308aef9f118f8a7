//! API request/response models for package groups.

use super::pagination::Pagination;
use crate::db::models::package_groups::PackageGroupDBResponse;
use crate::types::PackageGroupId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageGroupCreate {
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PackageGroupUpdate {
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageGroupResponse {
    pub id: PackageGroupId,
    pub label: String,
}

impl From<PackageGroupDBResponse> for PackageGroupResponse {
    fn from(db: PackageGroupDBResponse) -> Self {
        Self { id: db.id, label: db.label }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPackageGroupsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}
