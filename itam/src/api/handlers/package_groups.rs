use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::package_groups::{PackageGroupCreate, PackageGroupResponse, PackageGroupUpdate, ListPackageGroupsQuery},
    auth::current_user::{RequiresTier, tier},
    db::{
        errors::DbError,
        handlers::{PackageGroups, Repository, package_groups::PackageGroupFilter},
        models::package_groups::{PackageGroupCreateDBRequest, PackageGroupUpdateDBRequest},
    },
    errors::{Error, Result},
    types::PackageGroupId,
};

fn not_found(id: PackageGroupId) -> Error {
    Error::NotFound {
        resource: "Package group".to_string(),
        id: id.to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/packagegroups",
    tag = "package-groups",
    summary = "List package groups",
    params(ListPackageGroupsQuery),
    responses(
        (status = 200, description = "List of package groups", body = Vec<PackageGroupResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_package_groups(
    State(state): State<AppState>,
    Query(query): Query<ListPackageGroupsQuery>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<Vec<PackageGroupResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let groups = PackageGroups::new(&mut pool_conn).list(&PackageGroupFilter::new(skip, limit)).await?;

    Ok(Json(groups.into_iter().map(PackageGroupResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/packagegroups",
    tag = "package-groups",
    summary = "Create package group",
    request_body = PackageGroupCreate,
    responses(
        (status = 201, description = "Package group created", body = PackageGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_package_group(
    State(state): State<AppState>,
    _: RequiresTier<tier::Manager>,
    Json(create): Json<PackageGroupCreate>,
) -> Result<(StatusCode, Json<PackageGroupResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = PackageGroups::new(&mut pool_conn)
        .create(&PackageGroupCreateDBRequest::from(create))
        .await?;

    Ok((StatusCode::CREATED, Json(PackageGroupResponse::from(group))))
}

#[utoipa::path(
    get,
    path = "/packagegroups/{id}",
    tag = "package-groups",
    summary = "Get package group",
    params(("id" = i64, Path, description = "Package group ID")),
    responses(
        (status = 200, description = "Package group details", body = PackageGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Package group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_package_group(
    State(state): State<AppState>,
    Path(id): Path<PackageGroupId>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<PackageGroupResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match PackageGroups::new(&mut pool_conn).get_by_id(id).await? {
        Some(group) => Ok(Json(PackageGroupResponse::from(group))),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    patch,
    path = "/packagegroups/{id}",
    tag = "package-groups",
    summary = "Update package group",
    request_body = PackageGroupUpdate,
    params(("id" = i64, Path, description = "Package group ID")),
    responses(
        (status = 200, description = "Package group updated", body = PackageGroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Package group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_package_group(
    State(state): State<AppState>,
    Path(id): Path<PackageGroupId>,
    _: RequiresTier<tier::Manager>,
    Json(update): Json<PackageGroupUpdate>,
) -> Result<Json<PackageGroupResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = PackageGroups::new(&mut pool_conn)
        .update(id, &PackageGroupUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(id),
            other => other.into(),
        })?;

    Ok(Json(PackageGroupResponse::from(group)))
}

#[utoipa::path(
    delete,
    path = "/packagegroups/{id}",
    tag = "package-groups",
    summary = "Delete package group",
    description = "Members of the group are kept and detached from it.",
    params(("id" = i64, Path, description = "Package group ID")),
    responses(
        (status = 204, description = "Package group deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Package group not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_package_group(
    State(state): State<AppState>,
    Path(id): Path<PackageGroupId>,
    _: RequiresTier<tier::Manager>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if PackageGroups::new(&mut pool_conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
