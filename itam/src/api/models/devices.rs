//! API request/response models for devices.

use super::pagination::Pagination;
use crate::db::models::devices::DeviceDBResponse;
use crate::types::{DeviceGroupId, DeviceId};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeviceCreate {
    pub name: String,
    pub os: String,
    #[serde(default)]
    pub group_id: Option<DeviceGroupId>,
}

/// Partial update. Sending `"group_id": null` removes the device from its group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceUpdate {
    pub name: Option<String>,
    pub os: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub group_id: Option<Option<DeviceGroupId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceResponse {
    pub id: DeviceId,
    pub name: String,
    pub os: String,
    pub group_id: Option<DeviceGroupId>,
}

impl From<DeviceDBResponse> for DeviceResponse {
    fn from(db: DeviceDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            os: db.os,
            group_id: db.group_id,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDevicesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only devices in this group
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub group_id: Option<DeviceGroupId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: DeviceUpdate = serde_json::from_str(r#"{"name":"laptop-7"}"#).unwrap();
        assert_eq!(update.group_id, None);

        let update: DeviceUpdate = serde_json::from_str(r#"{"group_id":null}"#).unwrap();
        assert_eq!(update.group_id, Some(None));

        let update: DeviceUpdate = serde_json::from_str(r#"{"group_id":4}"#).unwrap();
        assert_eq!(update.group_id, Some(Some(4)));
    }
}
