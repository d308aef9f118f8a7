use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::users::{ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    auth::{
        current_user::{RequiresTier, tier},
        password::{self, Argon2Params},
    },
    db::{
        errors::DbError,
        handlers::{Repository, Users, users::UserFilter},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Tier, UserId},
};

fn not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

fn check_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Username must not be empty".to_string(),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _: RequiresTier<tier::Admin>,
) -> Result<Json<Vec<UserResponse>>> {
    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut pool_conn).list(&UserFilter::new(skip, limit)).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username already taken"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresTier<tier::Admin>,
    Json(create): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    check_username(&create.username)?;
    let password_config = &state.config.auth.password;
    password::validate_password(&create.password, password_config)?;

    let password_hash = password::hash_password(create.password, Argon2Params::from(password_config)).await?;
    let user = state
        .credentials
        .create(&UserCreateDBRequest {
            username: create.username.trim().to_string(),
            password_hash,
            tier: create.tier,
            is_active: create.is_active,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    description = "Administrators may read any user; everyone else only their own record.",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    RequiresTier(current_user, _): RequiresTier<tier::Viewer>,
) -> Result<Json<UserResponse>> {
    if id != current_user.id {
        state.access.authorize_caller(&current_user, Tier::ADMIN)?;
    }

    let user = state.credentials.find_by_id(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Administrators may change any field of any user. Other users may only change their own password.",
    request_body = UserUpdate,
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already taken"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    RequiresTier(current_user, _): RequiresTier<tier::Viewer>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    if id != current_user.id || update.touches_privileged_fields() {
        state.access.authorize_caller(&current_user, Tier::ADMIN)?;
    }

    if let Some(username) = &update.username {
        check_username(username)?;
    }

    let password_config = &state.config.auth.password;
    let password_hash = match update.password {
        Some(new_password) => {
            password::validate_password(&new_password, password_config)?;
            Some(password::hash_password(new_password, Argon2Params::from(password_config)).await?)
        }
        None => None,
    };

    let request = UserUpdateDBRequest {
        username: update.username.map(|u| u.trim().to_string()),
        password_hash,
        tier: update.tier,
        is_active: update.is_active,
    };

    let user = state.credentials.update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(id),
        other => other.into(),
    })?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    RequiresTier(current_user, _): RequiresTier<tier::Admin>,
) -> Result<StatusCode> {
    if id == current_user.id {
        return Err(Error::BadRequest {
            message: "Cannot delete your own account".to_string(),
        });
    }

    if state.credentials.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
