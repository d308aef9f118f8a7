//! Bearer token to live user record.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::auth::{store::CredentialStore, token::TokenCodec};
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;

/// Per-request identity gate.
#[derive(Clone)]
pub struct SessionResolver {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl SessionResolver {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    /// Resolve a bearer token to the user it names.
    ///
    /// The record is read fresh on every call, so tier and active-flag changes apply to
    /// outstanding tokens from the next request on. Deleted, renamed and deactivated users are
    /// rejected with [`Error::Unauthenticated`]; store failures surface as internal errors.
    #[instrument(skip_all, err(level = "debug"))]
    pub async fn resolve(&self, token: &str) -> Result<UserDBResponse, Error> {
        let claims = self.codec.verify(token)?;

        match self.store.find_by_username(&claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            Some(_) => {
                debug!(username = %claims.sub, "Token subject is deactivated");
                Err(Error::Unauthenticated)
            }
            None => {
                debug!(username = %claims.sub, "Token subject no longer exists");
                Err(Error::Unauthenticated)
            }
        }
    }
}
