//! Session and membership persistence

use super::super::errors::{SessionError, SessionResult};
use super::super::session::{Session, SessionMember, SessionRole, SessionStatus};
use super::super::types::{MemberId, SessionId, Timestamp, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

const SESSION_COLUMNS: &str = "id, master_id, name, description, status, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, session_id, user_id, role, joined_at";

/// Owns `sessions` and `session_members` rows.
///
/// Borrows a connection so every call joins the caller's transaction.
pub struct MembershipStore<'c> {
    conn: &'c Connection,
}

impl<'c> MembershipStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // ===== Sessions =====

    pub fn insert_session(&self, session: &Session) -> SessionResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, master_id, name, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id,
                session.master,
                session.name,
                session.description,
                session.status,
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &SessionId) -> SessionResult<Option<Session>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
                params![session_id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Like [`get_session`](Self::get_session) but absent sessions are an error
    pub fn require_session(&self, session_id: &SessionId) -> SessionResult<Session> {
        self.get_session(session_id)?
            .ok_or_else(|| SessionError::not_found("Session", session_id))
    }

    pub fn set_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
        now: Timestamp,
    ) -> SessionResult<()> {
        let changed = self.conn.execute(
            "UPDATE sessions SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, now, session_id],
        )?;
        if changed == 0 {
            return Err(SessionError::not_found("Session", session_id));
        }
        Ok(())
    }

    /// Delete a session; members, invites and characters cascade
    pub fn delete_session(&self, session_id: &SessionId) -> SessionResult<()> {
        let changed =
            self.conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])?;
        if changed == 0 {
            return Err(SessionError::not_found("Session", session_id));
        }
        Ok(())
    }

    /// Sessions `user` belongs to, newest first
    pub fn list_sessions_for_user(&self, user: &UserId) -> SessionResult<Vec<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.master_id, s.name, s.description, s.status, s.created_at, s.updated_at
             FROM sessions s
             JOIN session_members m ON m.session_id = s.id
             WHERE m.user_id = ?1
             ORDER BY s.created_at DESC, s.rowid DESC",
        )?;
        let sessions = stmt
            .query_map(params![user], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ===== Members =====

    /// Insert a membership unless one already exists.
    ///
    /// The first role written for a (session, user) pair wins; the stored row
    /// is returned either way.
    pub fn add_member(
        &self,
        session_id: &SessionId,
        user: &UserId,
        role: SessionRole,
    ) -> SessionResult<SessionMember> {
        let inserted = self.conn.execute(
            "INSERT INTO session_members (id, session_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (session_id, user_id) DO NOTHING",
            params![MemberId::generate(), session_id, user, role, Timestamp::now()],
        )?;
        if inserted == 0 {
            debug!(session_id = %session_id, user = %user, "membership already present");
        }
        self.require_member(session_id, user)
    }

    /// Insert or promote `user` to master of the session
    pub fn ensure_master(
        &self,
        session_id: &SessionId,
        user: &UserId,
    ) -> SessionResult<SessionMember> {
        self.conn.execute(
            "INSERT INTO session_members (id, session_id, user_id, role, joined_at)
             VALUES (?1, ?2, ?3, 'MASTER', ?4)
             ON CONFLICT (session_id, user_id) DO UPDATE SET role = 'MASTER'",
            params![MemberId::generate(), session_id, user, Timestamp::now()],
        )?;
        self.require_member(session_id, user)
    }

    pub fn is_member(&self, session_id: &SessionId, user: &UserId) -> SessionResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM session_members WHERE session_id = ?1 AND user_id = ?2)",
            params![session_id, user],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn get_member(
        &self,
        session_id: &SessionId,
        user: &UserId,
    ) -> SessionResult<Option<SessionMember>> {
        let member = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM session_members WHERE session_id = ?1 AND user_id = ?2",
                    MEMBER_COLUMNS
                ),
                params![session_id, user],
                member_from_row,
            )
            .optional()?;
        Ok(member)
    }

    fn require_member(
        &self,
        session_id: &SessionId,
        user: &UserId,
    ) -> SessionResult<SessionMember> {
        self.get_member(session_id, user)?
            .ok_or_else(|| SessionError::not_found("Member", user))
    }

    /// Members in join order
    pub fn list_members(&self, session_id: &SessionId) -> SessionResult<Vec<SessionMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM session_members WHERE session_id = ?1 ORDER BY joined_at, rowid",
            MEMBER_COLUMNS
        ))?;
        let members = stmt
            .query_map(params![session_id], member_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Remove a non-master member
    pub fn remove_member(&self, session: &Session, user: &UserId) -> SessionResult<()> {
        if session.is_master(user) {
            return Err(SessionError::InvalidOperation(
                "the session master cannot be removed".into(),
            ));
        }

        let removed = self.conn.execute(
            "DELETE FROM session_members WHERE session_id = ?1 AND user_id = ?2",
            params![session.id, user],
        )?;
        if removed == 0 {
            return Err(SessionError::not_found("Member", user));
        }
        Ok(())
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        master: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<SessionMember> {
    Ok(SessionMember {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: row.get(2)?,
        role: row.get(3)?,
        joined_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_session::storage::SessionSqlStore;

    fn with_session<T>(f: impl FnOnce(&MembershipStore<'_>, &Session) -> SessionResult<T>) -> T {
        let store = SessionSqlStore::memory().unwrap();
        store
            .with_transaction(|tx| {
                let members = MembershipStore::new(tx);
                let session = Session::new(UserId::from("alice"), "Dragon Hunt".into(), None);
                members.insert_session(&session)?;
                members.ensure_master(&session.id, &session.master)?;
                f(&members, &session)
            })
            .unwrap()
    }

    #[test]
    fn test_session_round_trip() {
        with_session(|members, session| {
            let loaded = members.require_session(&session.id)?;
            assert_eq!(&loaded, session);
            assert!(members.get_session(&SessionId::from("missing"))?.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_add_member_is_first_write_wins() {
        with_session(|members, session| {
            let bob = UserId::from("bob");
            let first = members.add_member(&session.id, &bob, SessionRole::Player)?;
            let second = members.add_member(&session.id, &bob, SessionRole::Master)?;

            assert_eq!(first.id, second.id);
            assert_eq!(second.role, SessionRole::Player);
            assert_eq!(members.list_members(&session.id)?.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn test_ensure_master_overwrites_role() {
        with_session(|members, session| {
            let bob = UserId::from("bob");
            members.add_member(&session.id, &bob, SessionRole::Player)?;
            let promoted = members.ensure_master(&session.id, &bob)?;
            assert_eq!(promoted.role, SessionRole::Master);
            Ok(())
        });
    }

    #[test]
    fn test_remove_member() {
        with_session(|members, session| {
            let bob = UserId::from("bob");
            members.add_member(&session.id, &bob, SessionRole::Player)?;
            members.remove_member(session, &bob)?;
            assert!(!members.is_member(&session.id, &bob)?);

            assert!(matches!(
                members.remove_member(session, &bob),
                Err(SessionError::NotFound { .. })
            ));
            assert!(matches!(
                members.remove_member(session, &session.master),
                Err(SessionError::InvalidOperation(_))
            ));
            assert!(members.is_member(&session.id, &session.master)?);
            Ok(())
        });
    }

    #[test]
    fn test_set_status_and_list_for_user() {
        with_session(|members, session| {
            members.set_status(&session.id, SessionStatus::Archived, Timestamp::now())?;
            assert!(members.require_session(&session.id)?.is_archived());

            let listed = members.list_sessions_for_user(&session.master)?;
            assert_eq!(listed.len(), 1);
            assert!(members.list_sessions_for_user(&UserId::from("carol"))?.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_delete_session_cascades() {
        with_session(|members, session| {
            members.delete_session(&session.id)?;
            assert!(members.list_members(&session.id)?.is_empty());
            assert!(matches!(
                members.delete_session(&session.id),
                Err(SessionError::NotFound { .. })
            ));
            Ok(())
        });
    }
}
