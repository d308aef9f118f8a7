//! Database models for users.

use crate::types::{Tier, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub password_hash: String,
    pub tier: Tier,
    pub is_active: bool,
}

/// Database request for updating a user. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub tier: Option<Tier>,
    pub is_active: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone, PartialEq)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub tier: Tier,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
