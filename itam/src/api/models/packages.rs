//! API request/response models for packages.

use super::pagination::Pagination;
use crate::db::models::packages::PackageDBResponse;
use crate::types::{DeviceGroupId, DeviceId, PackageGroupId, PackageId};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// A software package, optionally backed by an uploaded file and targeted at a device, a
/// device group, or both.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PackageCreate {
    pub name: String,
    /// Installer type, e.g. `msi` or `deb`
    pub kind: String,
    pub os_supported: String,
    /// Name of a file in the upload directory
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    #[serde(default)]
    pub group_id: Option<DeviceGroupId>,
    #[serde(default)]
    pub package_group_id: Option<PackageGroupId>,
}

/// Partial update. `null` clears a nullable field, an absent key leaves it unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PackageUpdate {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub os_supported: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub file: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub device_id: Option<Option<DeviceId>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub group_id: Option<Option<DeviceGroupId>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub package_group_id: Option<Option<PackageGroupId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageResponse {
    pub id: PackageId,
    pub name: String,
    pub kind: String,
    pub os_supported: String,
    pub file: Option<String>,
    pub device_id: Option<DeviceId>,
    pub group_id: Option<DeviceGroupId>,
    pub package_group_id: Option<PackageGroupId>,
}

impl From<PackageDBResponse> for PackageResponse {
    fn from(db: PackageDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            kind: db.kind,
            os_supported: db.os_supported,
            file: db.file,
            device_id: db.device_id,
            group_id: db.group_id,
            package_group_id: db.package_group_id,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPackagesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub device_id: Option<DeviceId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub group_id: Option<DeviceGroupId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub package_group_id: Option<PackageGroupId>,
}
