//! Deployment manifest returned by `POST /devices/{id}/deploy`.

use super::devices::DeviceResponse;
use super::packages::PackageResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A package scheduled for a device, with where to fetch its file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeploymentItem {
    #[serde(flatten)]
    pub package: PackageResponse,
    /// `/files/{file}` when the package has a file
    pub download_url: Option<String>,
    /// Whether the referenced file is present in the upload directory
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeploymentManifest {
    pub device: DeviceResponse,
    pub packages: Vec<DeploymentItem>,
}
