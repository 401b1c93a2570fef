//! Manager traits for session, membership and invite operations

use super::character::{SelectionAction, SessionCharacter};
use super::errors::SessionResult;
use super::invite::SessionInvite;
use super::session::{Session, SessionMember};
use super::types::{CharacterId, SessionId, Timestamp, UserId};

/// Session lifecycle and membership
pub trait SessionManager {
    /// Create a session; `user` becomes its master
    fn create_session(
        &self,
        user: &UserId,
        name: &str,
        description: Option<String>,
    ) -> SessionResult<Session>;

    /// Get a session (members only)
    fn get_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<Session>;

    /// Sessions `user` belongs to
    fn list_sessions(&self, user: &UserId) -> SessionResult<Vec<Session>>;

    /// Members of a session (members only)
    fn list_members(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> SessionResult<Vec<SessionMember>>;

    /// Archive a session (master only, one way)
    fn archive_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<Session>;

    /// Remove `target` from a session; the master may remove anyone but
    /// themselves, players may only remove themselves
    fn remove_member(
        &self,
        actor: &UserId,
        session_id: &SessionId,
        target: &UserId,
    ) -> SessionResult<()>;

    /// Delete a session and everything it owns (master only)
    fn delete_session(&self, user: &UserId, session_id: &SessionId) -> SessionResult<()>;

    /// Set the caller's active character in a session
    fn select_character(
        &self,
        user: &UserId,
        session_id: &SessionId,
        character_id: &CharacterId,
    ) -> SessionResult<(SessionCharacter, SelectionAction)>;
}

/// Invite minting and redemption
pub trait InviteManager {
    /// Mint an invite (master only, active sessions only)
    fn create_invite(
        &self,
        user: &UserId,
        session_id: &SessionId,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> SessionResult<SessionInvite>;

    /// Redeem `code` and join its session as a player
    fn join_by_code(&self, user: &UserId, code: &str) -> SessionResult<Session>;

    /// Look up an invite by code without redeeming it
    fn get_invite(&self, code: &str) -> SessionResult<SessionInvite>;

    /// Invites of a session (master only)
    fn list_invites(
        &self,
        user: &UserId,
        session_id: &SessionId,
    ) -> SessionResult<Vec<SessionInvite>>;
}
