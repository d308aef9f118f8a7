//! Common type definitions and the privilege tier scale.
//!
//! # ID Types
//!
//! All entity IDs are database-assigned integers wrapped in type aliases:
//!
//! - [`UserId`]: User account identifier
//! - [`DeviceId`], [`DeviceGroupId`]: Device inventory identifiers
//! - [`PackageId`], [`PackageGroupId`]: Package inventory identifiers
//!
//! # Privilege Tiers
//!
//! Every user carries a [`Tier`]. Lower numeric values are more privileged: `0` is an
//! administrator and `3` can only read. An operation declares the least privileged tier allowed
//! to perform it, and a user passes when their tier is numerically less than or equal to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Type aliases for IDs
pub type UserId = i64;
pub type DeviceId = i64;
pub type DeviceGroupId = i64;
pub type PackageId = i64;
pub type PackageGroupId = i64;

/// Privilege tier of a user. Lower is more privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(transparent)]
#[sqlx(transparent)]
#[schema(value_type = i32, example = 3)]
pub struct Tier(pub i32);

impl Tier {
    pub const ADMIN: Tier = Tier(0);
    pub const MANAGER: Tier = Tier(1);
    pub const OPERATOR: Tier = Tier(2);
    pub const VIEWER: Tier = Tier(3);

    /// Whether a user holding `self` may perform an operation that requires `required`.
    pub fn satisfies(self, required: Tier) -> bool {
        self.0 <= required.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Tier::ADMIN => write!(f, "admin"),
            Tier::MANAGER => write!(f, "manager"),
            Tier::OPERATOR => write!(f, "operator"),
            Tier::VIEWER => write!(f, "viewer"),
            Tier(other) => write!(f, "tier {other}"),
        }
    }
}
