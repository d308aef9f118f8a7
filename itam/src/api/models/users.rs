//! API request/response models for users.

use super::pagination::Pagination;
use crate::db::models::users::UserDBResponse;
use crate::types::{Tier, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn default_active() -> bool {
    true
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub tier: Tier,
    /// Defaults to `true`
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Partial update. Users other than administrators may only send `password`, and only for
/// their own account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub tier: Option<Tier>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Whether anything other than the password is being changed
    pub fn touches_privileged_fields(&self) -> bool {
        self.username.is_some() || self.tier.is_some() || self.is_active.is_some()
    }
}

// User response models. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub tier: Tier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            tier: db.tier,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// The authenticated caller, as resolved from their bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub tier: Tier,
    pub is_active: bool,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            tier: db.tier,
            is_active: db.is_active,
        }
    }
}
