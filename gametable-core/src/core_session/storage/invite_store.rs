//! Invite persistence and redemption

use super::super::code::InviteCodeGenerator;
use super::super::errors::{InviteRejection, SessionError, SessionResult};
use super::super::invite::SessionInvite;
use super::super::session::Session;
use super::super::types::{SessionId, Timestamp, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

const INVITE_COLUMNS: &str =
    "id, session_id, code, max_uses, uses_count, expires_at, created_by, created_at";

/// Owns `session_invites` rows
pub struct InviteStore<'c> {
    conn: &'c Connection,
}

impl<'c> InviteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Mint a new invite for `session` on behalf of its master
    pub fn create(
        &self,
        generator: &InviteCodeGenerator,
        session: &Session,
        master: &UserId,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
    ) -> SessionResult<SessionInvite> {
        if !session.is_master(master) {
            return Err(SessionError::permission(master, "create invites for this session"));
        }
        if max_uses == Some(0) {
            return Err(SessionError::Validation("max_uses must be at least 1".into()));
        }
        if let Some(expires_at) = expires_at.filter(|t| !t.is_storable()) {
            return Err(SessionError::Validation(format!(
                "expires_at {} is out of range (max {})",
                expires_at,
                i64::MAX
            )));
        }

        let code = generator.generate(&session.name, |candidate| self.code_exists(candidate))?;
        let invite =
            SessionInvite::new(session.id.clone(), code, master.clone(), max_uses, expires_at);

        self.conn.execute(
            "INSERT INTO session_invites
                (id, session_id, code, max_uses, uses_count, expires_at, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                invite.id,
                invite.session_id,
                invite.code,
                invite.max_uses,
                invite.uses_count,
                invite.expires_at,
                invite.created_by,
                invite.created_at,
            ],
        )?;

        debug!(session_id = %session.id, code = %invite.code, "invite stored");
        Ok(invite)
    }

    /// Consume one use of `code`.
    ///
    /// The increment and the validity check are a single conditional update,
    /// so concurrent redemptions can never push `uses_count` past `max_uses`.
    pub fn redeem(&self, code: &str, now: Timestamp) -> SessionResult<SessionInvite> {
        let changed = self.conn.execute(
            "UPDATE session_invites
             SET uses_count = uses_count + 1
             WHERE code = ?1
               AND (expires_at IS NULL OR expires_at > ?2)
               AND (max_uses IS NULL OR uses_count < max_uses)",
            params![code, now],
        )?;

        if changed == 0 {
            let invite = self.get(code)?.ok_or_else(|| SessionError::not_found("Invite", code))?;
            let reason = invite.rejection_at(now).unwrap_or(InviteRejection::Exhausted);
            warn!(code, %reason, "invite redemption rejected");
            return Err(SessionError::InvalidInvite {
                code: code.to_string(),
                reason,
            });
        }

        self.get(code)?.ok_or_else(|| SessionError::not_found("Invite", code))
    }

    /// Read-only lookup; no validity check
    pub fn get(&self, code: &str) -> SessionResult<Option<SessionInvite>> {
        let invite = self
            .conn
            .query_row(
                &format!("SELECT {} FROM session_invites WHERE code = ?1", INVITE_COLUMNS),
                params![code],
                invite_from_row,
            )
            .optional()?;
        Ok(invite)
    }

    /// Invites of a session, newest first
    pub fn list_for_session(&self, session_id: &SessionId) -> SessionResult<Vec<SessionInvite>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM session_invites WHERE session_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            INVITE_COLUMNS
        ))?;
        let invites = stmt
            .query_map(params![session_id], invite_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invites)
    }

    pub fn code_exists(&self, code: &str) -> SessionResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM session_invites WHERE code = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

fn invite_from_row(row: &Row<'_>) -> rusqlite::Result<SessionInvite> {
    Ok(SessionInvite {
        id: row.get(0)?,
        session_id: row.get(1)?,
        code: row.get(2)?,
        max_uses: row.get(3)?,
        uses_count: row.get(4)?,
        expires_at: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}
