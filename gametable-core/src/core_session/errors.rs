//! Error types for the session subsystem

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Why an existing invite refused a redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteRejection {
    /// `expires_at` is in the past
    Expired,
    /// `uses_count` reached `max_uses`
    Exhausted,
}

impl fmt::Display for InviteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteRejection::Expired => write!(f, "invite has expired"),
            InviteRejection::Exhausted => write!(f, "invite has reached maximum uses"),
        }
    }
}

/// Errors that can occur in session, membership and invite operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown session, invite, member or character
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Actor lacks the required role
    #[error("Permission denied: {user} cannot {action}")]
    PermissionDenied { user: String, action: String },

    /// Invite exists but can no longer be redeemed
    #[error("Invalid invite {code}: {reason}")]
    InvalidInvite {
        code: String,
        reason: InviteRejection,
    },

    /// Operation disallowed by the current session state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SessionError {
    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        SessionError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn permission(user: impl fmt::Display, action: impl Into<String>) -> Self {
        SessionError::PermissionDenied {
            user: user.to_string(),
            action: action.into(),
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "validation_error",
            SessionError::NotFound { .. } => "not_found",
            SessionError::PermissionDenied { .. } => "permission_denied",
            SessionError::InvalidInvite {
                reason: InviteRejection::Expired,
                ..
            } => "invite_expired",
            SessionError::InvalidInvite {
                reason: InviteRejection::Exhausted,
                ..
            } => "invite_exhausted",
            SessionError::InvalidOperation(_) => "invalid_operation",
            SessionError::Storage(_) => "storage_error",
        }
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(e: rusqlite::Error) -> Self {
        SessionError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for SessionError {
    fn from(e: r2d2::Error) -> Self {
        SessionError::Storage(format!("connection pool: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_kind() {
        let errors = [
            SessionError::Validation("x".into()),
            SessionError::not_found("Session", "s1"),
            SessionError::permission("bob", "create invites"),
            SessionError::InvalidInvite {
                code: "A".into(),
                reason: InviteRejection::Expired,
            },
            SessionError::InvalidInvite {
                code: "A".into(),
                reason: InviteRejection::Exhausted,
            },
            SessionError::InvalidOperation("archived".into()),
            SessionError::Storage("disk".into()),
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_error_display() {
        let err = SessionError::permission("bob", "create invites");
        assert_eq!(err.to_string(), "Permission denied: bob cannot create invites");

        let err = SessionError::InvalidInvite {
            code: "DRAGON12".into(),
            reason: InviteRejection::Exhausted,
        };
        assert_eq!(err.to_string(), "Invalid invite DRAGON12: invite has reached maximum uses");
    }
}
