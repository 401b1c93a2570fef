//! Request/Response types for the HTTP API
//!
//! Each endpoint has its own DTOs; domain types never cross the wire
//! directly.

use crate::core_session::{
    SelectionAction, Session, SessionCharacter, SessionInvite, SessionMember, SessionRole,
    SessionStatus, InviteStatus, Timestamp,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: String,
    pub name: String,
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub name: String,
    pub description: Option<String>,
    pub master: String,
    pub status: SessionStatus,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInfo {
    pub user_id: String,
    pub role: SessionRole,
    pub joined_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: SessionSummary,
    pub members: Vec<MemberInfo>,
}

impl From<&Session> for SessionCreateResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.to_string(),
            name: session.name.clone(),
            status: session.status,
        }
    }
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.to_string(),
            name: session.name.clone(),
            description: session.description.clone(),
            master: session.master.to_string(),
            status: session.status,
            created_at: session.created_at.as_millis(),
            updated_at: session.updated_at.as_millis(),
        }
    }
}

impl From<&SessionMember> for MemberInfo {
    fn from(member: &SessionMember) -> Self {
        Self {
            user_id: member.user_id.to_string(),
            role: member.role,
            joined_at: member.joined_at.as_millis(),
        }
    }
}

// ============================================================================
// Invite Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteCreateRequest {
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// Unix milliseconds
    #[serde(default)]
    pub expires_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteResponse {
    pub code: String,
    pub session_id: String,
    pub max_uses: Option<u32>,
    pub uses_count: u32,
    pub remaining_uses: Option<u32>,
    pub expires_at: Option<u64>,
    pub status: InviteStatus,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteListResponse {
    pub invites: Vec<InviteResponse>,
}

impl InviteResponse {
    pub fn at(invite: &SessionInvite, now: Timestamp) -> Self {
        Self {
            code: invite.code.clone(),
            session_id: invite.session_id.to_string(),
            max_uses: invite.max_uses,
            uses_count: invite.uses_count,
            remaining_uses: invite.remaining_uses(),
            expires_at: invite.expires_at.map(|t| t.as_millis()),
            status: invite.status_at(now),
            created_at: invite.created_at.as_millis(),
        }
    }
}

// ============================================================================
// Join & Character Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub session_id: String,
    pub session_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectCharacterRequest {
    pub session_id: String,
    pub character_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectCharacterResponse {
    pub session_id: String,
    pub character_id: String,
    pub action: SelectionAction,
}

impl SelectCharacterResponse {
    pub fn new(selection: &SessionCharacter, action: SelectionAction) -> Self {
        Self {
            session_id: selection.session_id.to_string(),
            character_id: selection.character_id.to_string(),
            action,
        }
    }
}

// ============================================================================
// Misc Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code
    pub error: String,
    pub message: String,
}
