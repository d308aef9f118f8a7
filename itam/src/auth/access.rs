//! Tier-based authorization.

use std::sync::Arc;

use crate::api::models::users::CurrentUser;
use crate::auth::audit::{AuditEvent, AuditSink};
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use crate::types::{Tier, UserId};

/// Decides whether an authenticated user may perform an operation requiring a given tier.
#[derive(Clone)]
pub struct AccessController {
    audit: Arc<dyn AuditSink>,
}

impl AccessController {
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }

    /// Allow when `user.tier` is at least as privileged as `required` (numerically `<=`).
    ///
    /// Denials are audited and returned as [`Error::InsufficientPermissions`], whose response
    /// body does not reveal the required tier.
    pub fn authorize(&self, user: &UserDBResponse, required: Tier) -> Result<(), Error> {
        self.check(user.id, &user.username, user.tier, required)
    }

    /// [`authorize`](Self::authorize) for a user already resolved by the request extractors.
    pub fn authorize_caller(&self, user: &CurrentUser, required: Tier) -> Result<(), Error> {
        self.check(user.id, &user.username, user.tier, required)
    }

    fn check(&self, user_id: UserId, username: &str, tier: Tier, required: Tier) -> Result<(), Error> {
        if tier.satisfies(required) {
            return Ok(());
        }

        self.audit.record(&AuditEvent::AccessDenied {
            user_id,
            username: username.to_string(),
            tier,
            required,
        });
        Err(Error::InsufficientPermissions { required })
    }
}
