//! Signed bearer tokens.
//!
//! Tokens are compact JWTs carrying the subject username, the issue time and an expiry. They are
//! never persisted; a token is valid exactly when its signature verifies under the configured
//! secret and algorithm and the current time is before its expiry.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{config::Config, errors::Error};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Any failure to verify a token. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid token")]
pub struct InvalidToken;

impl From<InvalidToken> for Error {
    fn from(_: InvalidToken) -> Self {
        Error::Unauthenticated
    }
}

/// Issues and verifies tokens with a single secret and algorithm.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").field("algorithm", &self.algorithm).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
            operation: "JWT sessions: secret_key is required".to_string(),
        })?;

        Ok(Self::new(secret_key.as_bytes(), config.auth.security.jwt_algorithm))
    }

    /// Sign a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, Error> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| Error::Internal {
            operation: format!("convert token lifetime: {e}"),
        })?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| Error::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Check signature, algorithm and expiry.
    ///
    /// The algorithm named in the token header is only compared against the configured one,
    /// never used to pick the verification method.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, InvalidToken> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(kind = ?e.kind(), "Rejected bearer token");
            InvalidToken
        })?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before its expiry
        if data.claims.exp <= Utc::now().timestamp() {
            debug!("Rejected bearer token at its expiry instant");
            return Err(InvalidToken);
        }

        Ok(data.claims)
    }
}
