//! Audit trail for authentication and authorization decisions.
//!
//! The auth core only describes what happened; where the record goes is up to the [`AuditSink`].
//! [`TracingAuditSink`] writes structured events on the `itam::audit` target. Those events are
//! emitted inside the per-request span opened by the HTTP trace layer, which already carries the
//! request method and path.

use crate::types::{Tier, UserId};

/// Target used for audit log events, usable in `RUST_LOG` filters.
pub const AUDIT_TARGET: &str = "itam::audit";

/// Something worth recording about an authentication or authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// Credentials accepted and a token issued
    LoginSucceeded { username: String },
    /// Credentials rejected. `username` is what was attempted and may not exist.
    LoginFailed { username: String },
    /// Authenticated user below the tier an operation requires
    AccessDenied {
        user_id: UserId,
        username: String,
        tier: Tier,
        required: Tier,
    },
}

/// Receives audit events. Implementations must not block.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Writes audit events to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        match event {
            AuditEvent::LoginSucceeded { username } => {
                tracing::info!(target: AUDIT_TARGET, action = "login", outcome = "success", %username, "Login succeeded");
            }
            AuditEvent::LoginFailed { username } => {
                tracing::warn!(target: AUDIT_TARGET, action = "login", outcome = "failure", %username, "Login failed");
            }
            AuditEvent::AccessDenied {
                user_id,
                username,
                tier,
                required,
            } => {
                tracing::warn!(
                    target: AUDIT_TARGET,
                    action = "authorize",
                    outcome = "denied",
                    user_id,
                    %username,
                    tier = tier.0,
                    required = required.0,
                    "Access denied"
                );
            }
        }
    }
}
