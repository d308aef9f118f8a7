//! Request extractors that authenticate and authorize the caller.
//!
//! [`CurrentUser`] resolves the `Authorization: Bearer <token>` header to a live user.
//! [`RequiresTier`] additionally runs the access controller against the tier named by its type
//! parameter, so a handler only runs once both checks pass:
//!
//! ```ignore
//! async fn delete_device(RequiresTier(user, _): RequiresTier<tier::Operator>, ...) { ... }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::models::users::UserDBResponse,
    errors::{Error, Result},
};

/// Type-level tier requirements for [`RequiresTier`].
pub mod tier {
    use crate::types::Tier;

    pub trait TierRequirement: Send + Sync + 'static {
        const TIER: Tier;
    }

    /// Tier 0 only
    pub struct Admin;
    /// Tier 1 or better
    pub struct Manager;
    /// Tier 2 or better
    pub struct Operator;
    /// Any tier up to 3
    pub struct Viewer;

    impl TierRequirement for Admin {
        const TIER: Tier = Tier::ADMIN;
    }
    impl TierRequirement for Manager {
        const TIER: Tier = Tier::MANAGER;
    }
    impl TierRequirement for Operator {
        const TIER: Tier = Tier::OPERATOR;
    }
    impl TierRequirement for Viewer {
        const TIER: Tier = Tier::VIEWER;
    }
}

use tier::TierRequirement;

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str> {
    let unauthenticated = || Error::Unauthenticated;

    let auth_str = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(unauthenticated)?
        .to_str()
        .map_err(|_| unauthenticated())?;

    // The scheme is case-insensitive
    let (scheme, token) = auth_str.split_once(' ').ok_or_else(unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(unauthenticated());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(unauthenticated());
    }
    Ok(token)
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Result<UserDBResponse> {
    let token = bearer_token(parts)?;
    state.resolver.resolve(token).await
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip_all, err(level = "debug"))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_user(parts, state).await?;
        Ok(CurrentUser::from(user))
    }
}

/// Authenticated user whose tier satisfies `T`.
pub struct RequiresTier<T: TierRequirement>(pub CurrentUser, pub PhantomData<T>);

impl<T: TierRequirement> FromRequestParts<AppState> for RequiresTier<T> {
    type Rejection = Error;

    #[instrument(skip_all, fields(required = T::TIER.0), err(level = "debug"))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = resolve_user(parts, state).await?;
        state.access.authorize(&user, T::TIER)?;
        Ok(RequiresTier(CurrentUser::from(user), PhantomData))
    }
}
