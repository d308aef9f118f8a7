use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::packages::{ListPackagesQuery, PackageCreate, PackageResponse, PackageUpdate},
    auth::current_user::{RequiresTier, tier},
    db::{
        errors::DbError,
        handlers::{Packages, Repository, file_storage::is_plain_file_name, packages::PackageFilter},
        models::packages::{PackageCreateDBRequest, PackageUpdateDBRequest},
    },
    errors::{Error, Result},
    types::PackageId,
};

fn not_found(id: PackageId) -> Error {
    Error::NotFound {
        resource: "Package".to_string(),
        id: id.to_string(),
    }
}

/// Packages may only point at files directly inside the upload directory.
fn check_file_reference(file: Option<&str>) -> Result<()> {
    match file {
        Some(name) if !is_plain_file_name(name) => Err(Error::BadRequest {
            message: format!("Invalid file name: {name:?}"),
        }),
        _ => Ok(()),
    }
}

#[utoipa::path(
    get,
    path = "/packages",
    tag = "packages",
    summary = "List packages",
    params(ListPackagesQuery),
    responses(
        (status = 200, description = "List of packages", body = Vec<PackageResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<ListPackagesQuery>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<Vec<PackageResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = PackageFilter {
        device_id: query.device_id,
        group_id: query.group_id,
        package_group_id: query.package_group_id,
        ..PackageFilter::new(skip, limit)
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let packages = Packages::new(&mut pool_conn).list(&filter).await?;

    Ok(Json(packages.into_iter().map(PackageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/packages",
    tag = "packages",
    summary = "Create package",
    request_body = PackageCreate,
    responses(
        (status = 201, description = "Package created", body = PackageResponse),
        (status = 400, description = "Invalid file name or unknown reference"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_package(
    State(state): State<AppState>,
    _: RequiresTier<tier::Manager>,
    Json(create): Json<PackageCreate>,
) -> Result<(StatusCode, Json<PackageResponse>)> {
    check_file_reference(create.file.as_deref())?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let package = Packages::new(&mut pool_conn).create(&PackageCreateDBRequest::from(create)).await?;

    Ok((StatusCode::CREATED, Json(PackageResponse::from(package))))
}

#[utoipa::path(
    get,
    path = "/packages/{id}",
    tag = "packages",
    summary = "Get package",
    params(("id" = i64, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package details", body = PackageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Package not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<PackageId>,
    _: RequiresTier<tier::Viewer>,
) -> Result<Json<PackageResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Packages::new(&mut pool_conn).get_by_id(id).await? {
        Some(package) => Ok(Json(PackageResponse::from(package))),
        None => Err(not_found(id)),
    }
}

#[utoipa::path(
    patch,
    path = "/packages/{id}",
    tag = "packages",
    summary = "Update package",
    request_body = PackageUpdate,
    params(("id" = i64, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package updated", body = PackageResponse),
        (status = 400, description = "Invalid file name or unknown reference"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Package not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_package(
    State(state): State<AppState>,
    Path(id): Path<PackageId>,
    _: RequiresTier<tier::Manager>,
    Json(update): Json<PackageUpdate>,
) -> Result<Json<PackageResponse>> {
    check_file_reference(update.file.as_ref().and_then(|f| f.as_deref()))?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let package = Packages::new(&mut pool_conn)
        .update(id, &PackageUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => not_found(id),
            other => other.into(),
        })?;

    Ok(Json(PackageResponse::from(package)))
}

#[utoipa::path(
    delete,
    path = "/packages/{id}",
    tag = "packages",
    summary = "Delete package",
    description = "The uploaded file the package refers to is left in place.",
    params(("id" = i64, Path, description = "Package ID")),
    responses(
        (status = 204, description = "Package deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Package not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_package(
    State(state): State<AppState>,
    Path(id): Path<PackageId>,
    _: RequiresTier<tier::Manager>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Packages::new(&mut pool_conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
