//! Credential store consumed by the authenticator and session resolver.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::{
    errors::Result,
    handlers::{Repository, Users},
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::UserId;

/// Persisted user records, looked up by username or id.
///
/// Saving a user is split into `create` and `update` depending on whether the record exists.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDBResponse>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;

    /// Returns whether a record was removed
    async fn delete(&self, id: UserId) -> Result<bool>;
}

/// [`CredentialStore`] over the application's SQLite pool.
///
/// Every call acquires its own pooled connection, which is returned to the pool when the call
/// finishes, whether it succeeds or fails.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_user_by_username(username).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await
    }

    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).update(id, request).await
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).delete(id).await
    }
}
