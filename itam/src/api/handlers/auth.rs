use axum::{Form, Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::models::{
        auth::{LoginForm, RegisterRequest, TokenResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::password::{self, Argon2Params},
    db::models::users::UserCreateDBRequest,
    errors::{Error, Result},
};

/// Exchange a username and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "authentication",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password"),
    )
)]
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Json<TokenResponse>> {
    let token = state.authenticator.login(&form.username, &form.password).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// The user the presented token resolves to
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Could not validate credentials"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(current_user: CurrentUser) -> Json<CurrentUser> {
    Json(current_user)
}

/// Create an account at the default tier
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Registration disabled or invalid input"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<UserResponse>)> {
    let auth_config = &state.config.auth;
    if !auth_config.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let username = request.username.trim();
    if username.is_empty() {
        return Err(Error::BadRequest {
            message: "Username must not be empty".to_string(),
        });
    }
    password::validate_password(&request.password, &auth_config.password)?;

    let password_hash = password::hash_password(request.password, Argon2Params::from(&auth_config.password)).await?;
    let user = state
        .credentials
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash,
            tier: auth_config.default_tier,
            is_active: true,
        })
        .await?;

    tracing::info!(user_id = user.id, "registered new user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
