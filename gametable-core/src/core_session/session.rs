//! Session data structures

use super::errors::{SessionError, SessionResult};
use super::types::{MemberId, SessionId, Timestamp, UserId};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a session name
pub const MAX_SESSION_NAME_LEN: usize = 150;

/// A game table owned by its master
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Owner of the session; always also a member with role `Master`
    pub master: UserId,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Lifecycle state
    pub status: SessionStatus,

    /// When the session was created
    pub created_at: Timestamp,

    /// Last time session metadata changed
    pub updated_at: Timestamp,
}

impl Session {
    /// Create a new active session owned by `master`
    pub fn new(master: UserId, name: String, description: Option<String>) -> Self {
        let now = Timestamp::now();
        Session {
            id: SessionId::generate(),
            master,
            name,
            description,
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if `user` is the session master
    pub fn is_master(&self, user: &UserId) -> bool {
        &self.master == user
    }

    pub fn is_archived(&self) -> bool {
        self.status == SessionStatus::Archived
    }

    /// Trim and validate a session name
    pub fn validate_name(name: &str) -> SessionResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SessionError::Validation("session name must not be empty".into()));
        }
        if trimmed.chars().count() > MAX_SESSION_NAME_LEN {
            return Err(SessionError::Validation(format!(
                "session name must be at most {} characters",
                MAX_SESSION_NAME_LEN
            )));
        }
        Ok(trimmed.to_string())
    }
}

/// Session lifecycle: `Active` → `Archived`, one way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Archived,
}

/// Session-level roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionRole {
    /// Administrative control: invites, archival, member removal
    Master,
    /// Regular participant
    Player,
}

/// Membership of a user in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMember {
    pub id: MemberId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub role: SessionRole,
    pub joined_at: Timestamp,
}

impl SessionMember {
    pub fn new(session_id: SessionId, user_id: UserId, role: SessionRole) -> Self {
        SessionMember {
            id: MemberId::generate(),
            session_id,
            user_id,
            role,
            joined_at: Timestamp::now(),
        }
    }
}

/// Failure to parse a stored enum value
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// String form, parsing and SQLite mapping for the stored enums.
macro_rules! stored_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

stored_enum!(SessionStatus, "session status", {
    Active => "ACTIVE",
    Archived => "ARCHIVED",
});

stored_enum!(SessionRole, "session role", {
    Master => "MASTER",
    Player => "PLAYER",
});
