use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        deploy::{DeploymentItem, DeploymentManifest},
        devices::{DeviceCreate, DeviceResponse, DeviceUpdate, ListDevicesQuery},
        packages::PackageResponse,
    },
    auth::current_user::{RequiresTier, tier},
    db::{
        errors::DbError,
        handlers::{Devices, Packages, Repository, devices::DeviceFilter},
        models::devices::{DeviceCreateDBRequest, DeviceUpdateDBRequest},
    },
    errors::{Error, Result},
    types::DeviceId,
};

fn not_found(id: DeviceId) -> Error {
    Error::NotFound {
        resource: "Device".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/devices",
    tag = "devices",
    summary = "List devices",
    params(ListDevicesQuery),
    responses(
        (status = 200, description = "List of devices", body = Vec<DeviceResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<ListDevicesQuery>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<Vec<DeviceResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut filter = DeviceFilter::new(skip, limit);
    if let Some(group_id) = query.group_id {
        filter = filter.with_group(group_id);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let devices = Devices::new(&mut pool_conn).list(&filter).await?;

    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    summary = "Register device",
    request_body = DeviceCreate,
    responses(
        (status = 201, description = "Device created", body = DeviceResponse),
        (status = 400, description = "Unknown device group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_device(
    State(state): State<AppState>,
    _: RequiresTier<tier::Operator>,
    Json(create): Json<DeviceCreate>,
) -> Result<(StatusCode, Json<DeviceResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let device = Devices::new(&mut pool_conn).create(&DeviceCreateDBRequest::from(create)).await?;

    Ok((StatusCode::CREATED, Json(DeviceResponse::from(device))))
}

#[utoipa::path(
    get,
    path = "/devices/{id}",
    tag = "devices",
    summary = "Get device",
    params(("id" = i64, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device details", body = DeviceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<DeviceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Devices::new(&mut pool_conn).get_by_id(id).await? {
        Some(device) => Ok(Json(DeviceResponse::from(device))),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    patch,
    path = "/devices/{id}",
    tag = "devices",
    summary = "Update device",
    request_body = DeviceUpdate,
    params(("id" = i64, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device updated", body = DeviceResponse),
        (status = 400, description = "Unknown device group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Device not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
    _: RequiresTier<tier::Operator>,
    Json(update): Json<DeviceUpdate>,
) -> Result<Json<DeviceResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let device = Devices::new(&mut pool_conn)
        .update(id, &DeviceUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(id),
            other => other.into(),
        })?;

    Ok(Json(DeviceResponse::from(device)))
}

#[utoipa::path(
    delete,
    path = "/devices/{id}",
    tag = "devices",
    summary = "Delete device",
    params(("id" = i64, Path, description = "Device ID")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Device not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
    _: RequiresTier<tier::Operator>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Devices::new(&mut pool_conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// Packages to install on a device: everything targeted at it directly or at its group
#[utoipa::path(
    get,
    path = "/devices/{id}/deploy",
    tag = "devices",
    summary = "Deployment manifest",
    params(("id" = i64, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Packages to deploy", body = DeploymentManifest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Device not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(device_id = id))]
pub async fn deploy_device(
    State(state): State<AppState>,
    Path(id): Path<DeviceId>,
    _: RequiresTier<tier::Operator>,
) -> Result<Json<DeploymentManifest>> {
    let (device, packages) = {
        let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let device = Devices::new(&mut pool_conn).get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        let packages = Packages::new(&mut pool_conn).targeting_device(device.id, device.group_id).await?;
        (device, packages)
    };

    let mut items = Vec::with_capacity(packages.len());
    for package in packages {
        let (download_url, available) = match &package.file {
            Some(file) => (Some(format!("/files/{file}")), state.files.exists(file).await?),
            None => (None, false),
        };
        items.push(DeploymentItem {
            package: PackageResponse::from(package),
            download_url,
            available,
        });
    }

    tracing::info!(packages = items.len(), "built deployment manifest");
    Ok(Json(DeploymentManifest {
        device: DeviceResponse::from(device),
        packages: items,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{deploy::DeploymentManifest, devices::DeviceResponse},
        test_utils::*,
        types::Tier,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[test_log::test(tokio::test)]
    async fn test_device_crud() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "op", Tier::OPERATOR).await;
        let auth = bearer(&state, "op");

        let response = server
            .post("/devices")
            .add_header("authorization", auth.clone())
            .json(&json!({"name": "laptop-01", "os": "linux"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let device: DeviceResponse = response.json();
        assert_eq!(device.group_id, None);

        let response = server
            .patch(&format!("/devices/{}", device.id))
            .add_header("authorization", auth.clone())
            .json(&json!({"os": "windows"}))
            .await;
        response.assert_status_ok();
        let updated: DeviceResponse = response.json();
        assert_eq!(updated.os, "windows");
        assert_eq!(updated.name, "laptop-01");

        server
            .delete(&format!("/devices/{}", device.id))
            .add_header("authorization", auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/devices/{}", device.id))
            .add_header("authorization", auth)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_group_is_rejected() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "op", Tier::OPERATOR).await;

        let response = server
            .post("/devices")
            .add_header("authorization", bearer(&state, "op"))
            .json(&json!({"name": "pc", "os": "linux", "group_id": 42}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "Invalid reference to related resource");
    }

    #[test_log::test(tokio::test)]
    async fn test_viewer_cannot_write_devices() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "viewer", Tier::VIEWER).await;
        let auth = bearer(&state, "viewer");

        server
            .get("/devices")
            .add_header("authorization", auth.clone())
            .await
            .assert_status_ok();
        server
            .post("/devices")
            .add_header("authorization", auth.clone())
            .json(&json!({"name": "pc", "os": "linux"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/devices/1/deploy")
            .add_header("authorization", auth)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_devices_by_group() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "manager", Tier::MANAGER).await;
        let auth = bearer(&state, "manager");

        let group: serde_json::Value = server
            .post("/devicegroups")
            .add_header("authorization", auth.clone())
            .json(&json!({"label": "Kiosks"}))
            .await
            .json();
        for (name, group_id) in [("kiosk-1", group["id"].clone()), ("kiosk-2", group["id"].clone()), ("desk", json!(null))] {
            server
                .post("/devices")
                .add_header("authorization", auth.clone())
                .json(&json!({"name": name, "os": "linux", "group_id": group_id}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let devices: Vec<DeviceResponse> = server
            .get(&format!("/devices?group_id={}", group["id"]))
            .add_header("authorization", auth.clone())
            .await
            .json();
        assert_eq!(devices.len(), 2);

        let devices: Vec<DeviceResponse> = server.get("/devices").add_header("authorization", auth).await.json();
        assert_eq!(devices.len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_deploy_manifest() {
        let (server, state, dir) = create_test_app().await;
        insert_test_user(&state, "manager", Tier::MANAGER).await;
        let auth = bearer(&state, "manager");

        let group: serde_json::Value = server
            .post("/devicegroups")
            .add_header("authorization", auth.clone())
            .json(&json!({"label": "Office"}))
            .await
            .json();
        let device: DeviceResponse = server
            .post("/devices")
            .add_header("authorization", auth.clone())
            .json(&json!({"name": "pc-01", "os": "windows", "group_id": group["id"]}))
            .await
            .json();
        let other: DeviceResponse = server
            .post("/devices")
            .add_header("authorization", auth.clone())
            .json(&json!({"name": "pc-02", "os": "windows"}))
            .await
            .json();

        std::fs::write(dir.path().join("firefox.msi"), b"installer").unwrap();
        let packages = [
            json!({"name": "firefox", "kind": "msi", "os_supported": "windows", "file": "firefox.msi", "device_id": device.id}),
            json!({"name": "office", "kind": "msi", "os_supported": "windows", "file": "office.msi", "group_id": group["id"]}),
            json!({"name": "notes", "kind": "script", "os_supported": "windows", "group_id": group["id"]}),
            json!({"name": "unrelated", "kind": "msi", "os_supported": "windows", "device_id": other.id}),
        ];
        for package in packages {
            server
                .post("/packages")
                .add_header("authorization", auth.clone())
                .json(&package)
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .get(&format!("/devices/{}/deploy", device.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status_ok();
        let manifest: DeploymentManifest = response.json();
        assert_eq!(manifest.device.id, device.id);

        let names: Vec<_> = manifest.packages.iter().map(|item| item.package.name.as_str()).collect();
        assert_eq!(names, ["firefox", "office", "notes"]);

        assert_eq!(manifest.packages[0].download_url.as_deref(), Some("/files/firefox.msi"));
        assert!(manifest.packages[0].available);
        assert_eq!(manifest.packages[1].download_url.as_deref(), Some("/files/office.msi"));
        assert!(!manifest.packages[1].available);
        assert_eq!(manifest.packages[2].download_url, None);

        server
            .get("/devices/9999/deploy")
            .add_header("authorization", auth)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
