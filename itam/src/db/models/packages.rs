//! Database models for packages.

use crate::api::models::packages::{PackageCreate, PackageUpdate};
use crate::types::{DeviceGroupId, DeviceId, PackageGroupId, PackageId};

#[derive(Debug, Clone)]
pub struct PackageCreateDBRequest {
    pub name: String,
    pub kind: String,
    pub os_supported: String,
    pub file: Option<String>,
    pub device_id: Option<DeviceId>,
    pub group_id: Option<DeviceGroupId>,
    pub package_group_id: Option<PackageGroupId>,
}

impl From<PackageCreate> for PackageCreateDBRequest {
    fn from(api: PackageCreate) -> Self {
        Self {
            name: api.name,
            kind: api.kind,
            os_supported: api.os_supported,
            file: api.file,
            device_id: api.device_id,
            group_id: api.group_id,
            package_group_id: api.package_group_id,
        }
    }
}

/// Nullable columns use `Option<Option<_>>`: outer `None` leaves the column unchanged,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PackageUpdateDBRequest {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub os_supported: Option<String>,
    pub file: Option<Option<String>>,
    pub device_id: Option<Option<DeviceId>>,
    pub group_id: Option<Option<DeviceGroupId>>,
    pub package_group_id: Option<Option<PackageGroupId>>,
}

impl From<PackageUpdate> for PackageUpdateDBRequest {
    fn from(api: PackageUpdate) -> Self {
        Self {
            name: api.name,
            kind: api.kind,
            os_supported: api.os_supported,
            file: api.file,
            device_id: api.device_id,
            group_id: api.group_id,
            package_group_id: api.package_group_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDBResponse {
    pub id: PackageId,
    pub name: String,
    pub kind: String,
    pub os_supported: String,
    pub file: Option<String>,
    pub device_id: Option<DeviceId>,
    pub group_id: Option<DeviceGroupId>,
    pub package_group_id: Option<PackageGroupId>,
}
