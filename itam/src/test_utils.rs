//! Shared helpers for unit and HTTP tests.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::Algorithm;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::{
    AppState, Application,
    auth::{
        audit::{AuditEvent, AuditSink},
        password::{self, Argon2Params},
        store::CredentialStore,
        token::TokenCodec,
    },
    config::{AuthConfig, Config, DatabaseConfig, FilesConfig, PasswordConfig, SecurityConfig},
    db::{
        errors::{DbError, Result as DbResult},
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
    types::{Tier, UserId},
};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Password given to every user created by [`insert_test_user`]
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Cheap Argon2 parameters so the suite stays fast
pub const FAST_ARGON2: Argon2Params = Argon2Params {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

/// Fresh in-memory database with the schema applied.
///
/// A single connection, since every connection to `:memory:` would otherwise see its own empty
/// database.
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open test database");
    crate::migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn create_test_config(upload_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        },
        database_url: None,
        secret_key: Some(TEST_SECRET.to_string()),
        admin_username: "admin".to_string(),
        admin_password: None,
        auth: AuthConfig {
            allow_registration: true,
            default_tier: Tier::VIEWER,
            security: SecurityConfig {
                jwt_algorithm: Algorithm::HS256,
                jwt_expiry: Duration::from_secs(30 * 60),
            },
            password: PasswordConfig {
                min_length: 8,
                max_length: 64,
                argon2_memory_kib: FAST_ARGON2.memory_kib,
                argon2_iterations: FAST_ARGON2.iterations,
                argon2_parallelism: FAST_ARGON2.parallelism,
            },
        },
        files: FilesConfig {
            upload_dir: upload_dir.to_path_buf(),
            ..Default::default()
        },
    }
}

/// App state over a fresh database, uploading into a temporary directory that lives as long as
/// the returned [`TempDir`].
pub async fn create_test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create upload dir");
    let state = AppState::from_pool(create_test_pool().await, create_test_config(dir.path())).expect("Failed to build app state");
    (state, dir)
}

pub async fn create_test_app() -> (TestServer, AppState, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create upload dir");
    let (server, state) = create_test_app_with_config(create_test_config(dir.path())).await;
    (server, state, dir)
}

pub async fn create_test_app_with_config(config: Config) -> (TestServer, AppState) {
    let app = Application::new_with_pool(config, Some(create_test_pool().await))
        .await
        .expect("Failed to create application");
    let state = app.state().clone();
    (app.into_test_server(), state)
}

/// Active user with [`TEST_PASSWORD`]
pub async fn insert_test_user(state: &AppState, username: &str, tier: Tier) -> UserDBResponse {
    let password_hash = password::hash_string_with_params(TEST_PASSWORD, Some(FAST_ARGON2)).expect("Failed to hash password");
    state
        .credentials
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            password_hash,
            tier,
            is_active: true,
        })
        .await
        .expect("Failed to create test user")
}

pub fn test_codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET.as_bytes(), Algorithm::HS256)
}

/// Token for `username`, signed with the secret `state` verifies against
pub fn token_for(state: &AppState, username: &str) -> String {
    TokenCodec::from_config(&state.config)
        .expect("Failed to build token codec")
        .issue(username, Duration::from_secs(300))
        .expect("Failed to issue token")
}

/// `Authorization` header value for `username`
pub fn bearer(state: &AppState, username: &str) -> String {
    format!("Bearer {}", token_for(state, username))
}

pub fn test_user(id: UserId, username: &str, tier: Tier) -> UserDBResponse {
    let now = Utc::now();
    UserDBResponse {
        id,
        username: username.to_string(),
        password_hash: String::new(),
        tier,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// [`CredentialStore`] backed by a map, for testing the auth core without a database.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<UserId, UserDBResponse>>,
    next_id: AtomicI64,
    fail_next: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn insert_user(&self, username: &str, password: &str, tier: Tier, is_active: bool) -> UserDBResponse {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = UserDBResponse {
            password_hash: password::hash_string_with_params(password, Some(FAST_ARGON2)).unwrap(),
            is_active,
            ..test_user(id, username, tier)
        };
        self.users.write().unwrap().insert(id, user.clone());
        user
    }

    /// Make the next lookup fail as if the database were unreachable
    pub fn fail_next_lookup(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> DbResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(DbError::Other(anyhow::anyhow!("connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> DbResult<Option<UserDBResponse>> {
        self.check_failure()?;
        Ok(self.users.read().unwrap().values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserDBResponse>> {
        self.check_failure()?;
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn create(&self, request: &UserCreateDBRequest) -> DbResult<UserDBResponse> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.username == request.username) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users.username".to_string()),
                table: Some("users".to_string()),
                message: "UNIQUE constraint failed: users.username".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = UserDBResponse {
            password_hash: request.password_hash.clone(),
            is_active: request.is_active,
            ..test_user(id, &request.username, request.tier)
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> DbResult<UserDBResponse> {
        let mut users = self.users.write().unwrap();
        let user = users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(username) = &request.username {
            user.username = username.clone();
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(tier) = request.tier {
            user.tier = tier;
        }
        if let Some(is_active) = request.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> DbResult<bool> {
        Ok(self.users.write().unwrap().remove(&id).is_some())
    }
}

/// [`AuditSink`] that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Counts ERROR events seen by the subscriber it is installed into.
#[derive(Clone, Default)]
pub struct ErrorEventCounter(Arc<AtomicUsize>);

impl ErrorEventCounter {
    /// Install as the default subscriber for the current thread until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorEventCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
