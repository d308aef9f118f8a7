//! API request/response models for device groups.

use super::pagination::Pagination;
use crate::db::models::device_groups::DeviceGroupDBResponse;
use crate::types::DeviceGroupId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupCreate {
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupUpdate {
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceGroupResponse {
    pub id: DeviceGroupId,
    pub label: String,
}

impl From<DeviceGroupDBResponse> for DeviceGroupResponse {
    fn from(db: DeviceGroupDBResponse) -> Self {
        Self { id: db.id, label: db.label }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDeviceGroupsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}
