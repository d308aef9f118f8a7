use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::device_groups::{DeviceGroupCreate, DeviceGroupResponse, DeviceGroupUpdate, ListDeviceGroupsQuery},
    auth::current_user::{RequiresTier, tier},
    db::{
        errors::DbError,
        handlers::{DeviceGroups, Repository, device_groups::DeviceGroupFilter},
        models::device_groups::{DeviceGroupCreateDBRequest, DeviceGroupUpdateDBRequest},
    },
    errors::{Error, Result},
    types::DeviceGroupId,
};

fn not_found(id: DeviceGroupId) -> Error {
    Error::NotFound {
        resource: "Device group".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/devicegroups",
    tag = "device-groups",
    summary = "List device groups",
    params(ListDeviceGroupsQuery),
    responses(
        (status = 200, description = "List of device groups", body = Vec<DeviceGroupResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_device_groups(
    State(state): State<AppState>,
    Query(query): Query<ListDeviceGroupsQuery>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<Vec<DeviceGroupResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let groups = DeviceGroups::new(&mut pool_conn).list(&DeviceGroupFilter::new(skip, limit)).await?;

    Ok(Json(groups.into_iter().map(DeviceGroupResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/devicegroups",
    tag = "device-groups",
    summary = "Create device group",
    request_body = DeviceGroupCreate,
    responses(
        (status = 201, description = "Device group created", body = DeviceGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_device_group(
    State(state): State<AppState>,
    _: RequiresTier<tier::Manager>,
    Json(create): Json<DeviceGroupCreate>,
) -> Result<(StatusCode, Json<DeviceGroupResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = DeviceGroups::new(&mut pool_conn)
        .create(&DeviceGroupCreateDBRequest::from(create))
        .await?;

    Ok((StatusCode::CREATED, Json(DeviceGroupResponse::from(group))))
}

#[utoipa::path(
    get,
    path = "/devicegroups/{id}",
    tag = "device-groups",
    summary = "Get device group",
    params(("id" = i64, Path, description = "Device group ID")),
    responses(
        (status = 200, description = "Device group details", body = DeviceGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Device group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_device_group(
    State(state): State<AppState>,
    Path(id): Path<DeviceGroupId>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<DeviceGroupResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match DeviceGroups::new(&mut pool_conn).get_by_id(id).await? {
        Some(group) => Ok(Json(DeviceGroupResponse::from(group))),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    patch,
    path = "/devicegroups/{id}",
    tag = "device-groups",
    summary = "Update device group",
    request_body = DeviceGroupUpdate,
    params(("id" = i64, Path, description = "Device group ID")),
    responses(
        (status = 200, description = "Device group updated", body = DeviceGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Device group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_device_group(
    State(state): State<AppState>,
    Path(id): Path<DeviceGroupId>,
    _: RequiresTier<tier::Manager>,
    Json(update): Json<DeviceGroupUpdate>,
) -> Result<Json<DeviceGroupResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = DeviceGroups::new(&mut pool_conn)
        .update(id, &DeviceGroupUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(id),
            other => other.into(),
        })?;

    Ok(Json(DeviceGroupResponse::from(group)))
}

#[utoipa::path(
    delete,
    path = "/devicegroups/{id}",
    tag = "device-groups",
    summary = "Delete device group",
    description = "Members of the group are kept and detached from it.",
    params(("id" = i64, Path, description = "Device group ID")),
    responses(
        (status = 204, description = "Device group deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Device group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_device_group(
    State(state): State<AppState>,
    Path(id): Path<DeviceGroupId>,
    _: RequiresTier<tier::Manager>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if DeviceGroups::new(&mut pool_conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{device_groups::DeviceGroupResponse, devices::DeviceResponse},
        test_utils::*,
        types::Tier,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[test_log::test(tokio::test)]
    async fn test_device_group_crud() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "manager", Tier::MANAGER).await;
        let auth = bearer(&state, "manager");

        let response = server
            .post("/devicegroups")
            .add_header("authorization", auth.clone())
            .json(&json!({"label": "Lab machines"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let group: DeviceGroupResponse = response.json();
        assert_eq!(group.label, "Lab machines");

        let response = server
            .patch(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth.clone())
            .json(&json!({"label": "Lab"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<DeviceGroupResponse>().label, "Lab");

        let response = server
            .get(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status_ok();

        let response = server.get("/devicegroups").add_header("authorization", auth.clone()).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Vec<DeviceGroupResponse>>().len(), 1);

        let response = server
            .delete(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .get(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth.clone())
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .patch(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth)
            .json(&json!({"label": "gone"}))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_deleting_group_detaches_devices() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "manager", Tier::MANAGER).await;
        let auth = bearer(&state, "manager");

        let group: DeviceGroupResponse = server
            .post("/devicegroups")
            .add_header("authorization", auth.clone())
            .json(&json!({"label": "Office"}))
            .await
            .json();
        let device: DeviceResponse = server
            .post("/devices")
            .add_header("authorization", auth.clone())
            .json(&json!({"name": "pc-01", "os": "windows", "group_id": group.id}))
            .await
            .json();
        assert_eq!(device.group_id, Some(group.id));

        server
            .delete(&format!("/devicegroups/{}", group.id))
            .add_header("authorization", auth.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let device: DeviceResponse = server
            .get(&format!("/devices/{}", device.id))
            .add_header("authorization", auth)
            .await
            .json();
        assert_eq!(device.group_id, None);
    }

    #[test_log::test(tokio::test)]
    async fn test_writes_need_manager() {
        let (server, state, _dir) = create_test_app().await;
        insert_test_user(&state, "op", Tier::OPERATOR).await;
        let auth = bearer(&state, "op");

        server
            .get("/devicegroups")
            .add_header("authorization", auth.clone())
            .await
            .assert_status_ok();
        server
            .post("/devicegroups")
            .add_header("authorization", auth)
            .json(&json!({"label": "nope"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
