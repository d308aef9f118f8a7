//! Authentication and authorization.
//!
//! Every protected request flows through the same pipeline:
//!
//! ```text
//! Authorization: Bearer <token>
//!        │
//!        ↓
//! SessionResolver ── token invalid / user gone / inactive ──→ 401
//!        │ live user record
//!        ↓
//! AccessController ── tier not privileged enough ──→ 403 (audited)
//!        │
//!        ↓
//!     handler
//! ```
//!
//! Tokens are obtained from [`Authenticator::login`], which checks a username and password
//! against the [`CredentialStore`] and issues a token through the [`TokenCodec`].
//!
//! # Modules
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`token`]: Signing and verifying expiring bearer tokens
//! - [`store`]: The credential store interface and its SQLite implementation
//! - [`authenticator`]: Username/password login
//! - [`resolver`]: Token to live user record
//! - [`access`]: Tier checks
//! - [`audit`]: Where login and authorization decisions are recorded
//! - [`current_user`]: Axum extractors wiring the above into handlers
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use itam::auth::current_user::{RequiresTier, tier};
//!
//! async fn list_devices(RequiresTier(user, _): RequiresTier<tier::Viewer>) -> String {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

pub mod access;
pub mod audit;
pub mod authenticator;
pub mod current_user;
pub mod password;
pub mod resolver;
pub mod store;
pub mod token;

pub use access::AccessController;
pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use authenticator::Authenticator;
pub use resolver::SessionResolver;
pub use store::{CredentialStore, SqliteCredentialStore};
pub use token::TokenCodec;
