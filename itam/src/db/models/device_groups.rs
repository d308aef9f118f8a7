//! Database models for device groups.

use crate::api::models::device_groups::{DeviceGroupCreate, DeviceGroupUpdate};
use crate::types::DeviceGroupId;

#[derive(Debug, Clone)]
pub struct DeviceGroupCreateDBRequest {
    pub label: String,
}

impl From<DeviceGroupCreate> for DeviceGroupCreateDBRequest {
    fn from(api: DeviceGroupCreate) -> Self {
        Self { label: api.label }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceGroupUpdateDBRequest {
    pub label: Option<String>,
}

impl From<DeviceGroupUpdate> for DeviceGroupUpdateDBRequest {
    fn from(api: DeviceGroupUpdate) -> Self {
        Self { label: api.label }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceGroupDBResponse {
    pub id: DeviceGroupId,
    pub label: String,
}
