//! # itam: IT asset management backend
//!
//! `itam` keeps an inventory of managed devices and the software packages deployed to them, and
//! serves the installer files those packages point at. Devices and packages can be grouped, and a
//! package targeted at a device group is deployed to every device in it.
//!
//! ## Access control
//!
//! Every user holds a privilege [`Tier`](types::Tier), where lower is more privileged:
//!
//! | Tier | Name     | Can                                              |
//! |------|----------|--------------------------------------------------|
//! | 0    | admin    | everything, including user administration        |
//! | 1    | manager  | manage groups, packages and files                |
//! | 2    | operator | manage devices and build deployment manifests    |
//! | 3    | viewer   | read the inventory                               |
//!
//! Clients log in at `POST /auth/login` and send the returned token as
//! `Authorization: Bearer <token>`. Each request resolves the token to the user's current record
//! (see [`auth`]), so deactivating or demoting a user takes effect immediately.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); persistence is SQLite through
//! [SQLx](https://github.com/launchbadge/sqlx) with embedded migrations. Uploaded files live flat
//! in a configurable directory.
//!
//! - [`api`]: Handlers and request/response models
//! - [`auth`]: Password hashing, tokens, session resolution and tier checks
//! - [`db`]: Repositories, database models and file storage
//! - [`config`]: YAML + environment configuration
//!
//! ## Running
//!
//! ```bash
//! ITAM_SECRET_KEY=change-me ITAM_ADMIN_PASSWORD=change-me-too itam -f config.yaml
//! ```
//!
//! The API reference is served at `/docs`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
#[cfg(test)]
mod test_utils;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use bon::Builder;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::{
        AccessController, Authenticator, CredentialStore, SessionResolver, SqliteCredentialStore, TokenCodec, TracingAuditSink,
        password::{self, Argon2Params},
    },
    db::{
        handlers::{
            Repository, Users,
            file_storage::{FileStorage, LocalFileStorage},
        },
        models::users::UserCreateDBRequest,
    },
    openapi::ApiDoc,
    types::{Tier, UserId},
};
pub use config::Config;
pub use errors::{Error, Result};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state shared across all request handlers.
///
/// Cheap to clone; everything heavy sits behind an `Arc` or is itself a handle (the pool).
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .authenticator(authenticator)
///     .resolver(resolver)
///     .access(access)
///     .credentials(credentials)
///     .files(files)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub authenticator: Authenticator,
    pub resolver: SessionResolver,
    pub access: AccessController,
    pub credentials: Arc<dyn CredentialStore>,
    pub files: Arc<dyn FileStorage>,
}

impl AppState {
    /// Wire the auth components and file storage around an open pool.
    pub fn from_pool(db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let codec = Arc::new(TokenCodec::from_config(&config).context("build token codec")?);
        let credentials: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(db.clone()));
        let audit = Arc::new(TracingAuditSink);

        let authenticator = Authenticator::new(
            credentials.clone(),
            codec.clone(),
            audit.clone(),
            config.auth.security.jwt_expiry,
            Argon2Params::from(&config.auth.password),
        )
        .context("build authenticator")?;

        Ok(AppState::builder()
            .db(db)
            .authenticator(authenticator)
            .resolver(SessionResolver::new(codec, credentials.clone()))
            .access(AccessController::new(audit))
            .credentials(credentials)
            .files(Arc::new(LocalFileStorage::new(config.files.upload_dir.clone())))
            .config(config)
            .build())
    }
}

/// Get the itam database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: an existing user with this name is promoted to an active administrator and has
/// its password reset to `password`. Returns the admin's user ID.
#[instrument(skip_all, fields(username = %username))]
pub async fn create_initial_admin_user(username: &str, password: &str, params: Argon2Params, db: &SqlitePool) -> anyhow::Result<UserId> {
    let password_hash = password::hash_password(password.to_string(), params)
        .await
        .context("hash admin password")?;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_username(username).await? {
        sqlx::query("UPDATE users SET password_hash = ?, tier = ?, is_active = 1, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Tier::ADMIN)
            .bind(chrono::Utc::now())
            .bind(existing_user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!("Admin user already exists, password and tier refreshed");
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash,
            tier: Tier::ADMIN,
            is_active: true,
        })
        .await?;

    tx.commit().await?;
    info!(user_id = created_user.id, "Created initial admin user");
    Ok(created_user.id)
}

/// Build the application router with every route and middleware layer.
pub fn build_router(state: &AppState) -> Router {
    use api::handlers::{auth, device_groups, devices, files, package_groups, packages, users};

    let upload_limit = usize::try_from(state.config.files.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/register", post(auth::register));

    let api_routes = Router::new()
        // User management
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).patch(users::update_user).delete(users::delete_user),
        )
        // Devices
        .route("/devices", get(devices::list_devices).post(devices::create_device))
        .route(
            "/devices/{id}",
            get(devices::get_device).patch(devices::update_device).delete(devices::delete_device),
        )
        .route("/devices/{id}/deploy", get(devices::deploy_device))
        .route(
            "/devicegroups",
            get(device_groups::list_device_groups).post(device_groups::create_device_group),
        )
        .route(
            "/devicegroups/{id}",
            get(device_groups::get_device_group)
                .patch(device_groups::update_device_group)
                .delete(device_groups::delete_device_group),
        )
        // Packages
        .route("/packages", get(packages::list_packages).post(packages::create_package))
        .route(
            "/packages/{id}",
            get(packages::get_package).patch(packages::update_package).delete(packages::delete_package),
        )
        .route(
            "/packagegroups",
            get(package_groups::list_package_groups).post(package_groups::create_package_group),
        )
        .route(
            "/packagegroups/{id}",
            get(package_groups::get_package_group)
                .patch(package_groups::update_package_group)
                .delete(package_groups::delete_package_group),
        )
        // Files
        .route(
            "/files",
            get(files::list_files).post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/{name}", get(files::download_file).delete(files::delete_file));

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .merge(api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] opens the database, runs migrations and seeds the admin user
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool closes
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], reusing `pool` instead of connecting to `config.database`.
    pub async fn new_with_pool(config: Config, pool: Option<SqlitePool>) -> anyhow::Result<Self> {
        debug!(
            bind_address = %config.bind_address(),
            database = %config.database.url,
            upload_dir = %config.files.upload_dir.display(),
            "Starting itam"
        );

        let pool = match pool {
            Some(pool) => pool,
            None => db::connect(&config.database)
                .await
                .with_context(|| format!("connect to {}", config.database.url))?,
        };
        migrator().run(&pool).await.context("run database migrations")?;

        match &config.admin_password {
            Some(admin_password) => {
                create_initial_admin_user(
                    &config.admin_username,
                    admin_password,
                    Argon2Params::from(&config.auth.password),
                    &pool,
                )
                .await?;
            }
            None => warn!("No admin_password configured; skipping initial admin user"),
        }

        let app_state = AppState::from_pool(pool.clone(), config.clone())?;
        let router = build_router(&app_state);

        Ok(Self {
            router,
            app_state,
            config,
            pool,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "itam listening on http://{}, API reference at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
