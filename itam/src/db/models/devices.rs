//! Database models for devices.

use crate::api::models::devices::{DeviceCreate, DeviceUpdate};
use crate::types::{DeviceGroupId, DeviceId};

#[derive(Debug, Clone)]
pub struct DeviceCreateDBRequest {
    pub name: String,
    pub os: String,
    pub group_id: Option<DeviceGroupId>,
}

impl From<DeviceCreate> for DeviceCreateDBRequest {
    fn from(api: DeviceCreate) -> Self {
        Self {
            name: api.name,
            os: api.os,
            group_id: api.group_id,
        }
    }
}

/// `group_id: Some(None)` detaches the device from its group; `None` leaves it unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdateDBRequest {
    pub name: Option<String>,
    pub os: Option<String>,
    pub group_id: Option<Option<DeviceGroupId>>,
}

impl From<DeviceUpdate> for DeviceUpdateDBRequest {
    fn from(api: DeviceUpdate) -> Self {
        Self {
            name: api.name,
            os: api.os,
            group_id: api.group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDBResponse {
    pub id: DeviceId,
    pub name: String,
    pub os: String,
    pub group_id: Option<DeviceGroupId>,
}
