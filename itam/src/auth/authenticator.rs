//! Username/password login.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::auth::{
    audit::{AuditEvent, AuditSink},
    password::{self, Argon2Params},
    store::CredentialStore,
    token::TokenCodec,
};
use crate::errors::Error;

/// Checks credentials against the [`CredentialStore`] and issues tokens.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    audit: Arc<dyn AuditSink>,
    ttl: Duration,
    /// Verified against when the username is unknown, so a miss costs as much as a wrong password
    dummy_hash: Arc<str>,
}

impl Authenticator {
    /// Build an authenticator issuing tokens valid for `ttl`.
    ///
    /// Hashes a throwaway password with `params` so failed lookups take as long as failed
    /// verifications.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        audit: Arc<dyn AuditSink>,
        ttl: Duration,
        params: Argon2Params,
    ) -> Result<Self, Error> {
        let dummy_hash = password::hash_string_with_params("itam-timing-equaliser", Some(params))?;

        Ok(Self {
            store,
            codec,
            audit,
            ttl,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Verify `username`/`password` and return a signed token for the user.
    ///
    /// Unknown users, inactive users and wrong passwords all yield the same
    /// [`Error::InvalidCredentials`].
    #[instrument(skip(self, password), err(level = "debug"))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, Error> {
        let user = self.store.find_by_username(username).await?;

        let (hash, active) = match &user {
            Some(user) => (user.password_hash.clone(), user.is_active),
            None => (self.dummy_hash.to_string(), false),
        };
        let password_ok = password::verify_password(password.to_string(), hash).await?;

        let user = match user {
            Some(user) if active && password_ok => user,
            _ => {
                self.audit.record(&AuditEvent::LoginFailed {
                    username: username.to_string(),
                });
                return Err(Error::InvalidCredentials);
            }
        };

        let token = self.codec.issue(&user.username, self.ttl)?;
        self.audit.record(&AuditEvent::LoginSucceeded { username: user.username });

        Ok(token)
    }
}
