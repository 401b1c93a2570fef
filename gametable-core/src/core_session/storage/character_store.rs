//! Per-session character bindings

use super::super::character::{SelectionAction, SessionCharacter};
use super::super::errors::{SessionError, SessionResult};
use super::super::types::{CharacterId, SessionCharacterId, SessionId, Timestamp, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CHARACTER_COLUMNS: &str = "id, session_id, user_id, character_id, joined_at, updated_at";

/// Owns `session_characters` rows, one per (session, user)
pub struct SessionCharacterStore<'c> {
    conn: &'c Connection,
}

impl<'c> SessionCharacterStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Bind `character_id` as the user's active character, replacing any
    /// previous selection
    pub fn upsert(
        &self,
        session_id: &SessionId,
        user: &UserId,
        character_id: &CharacterId,
        now: Timestamp,
    ) -> SessionResult<(SessionCharacter, SelectionAction)> {
        let updated = self.conn.execute(
            "UPDATE session_characters SET character_id = ?1, updated_at = ?2
             WHERE session_id = ?3 AND user_id = ?4",
            params![character_id, now, session_id, user],
        )?;

        let action = if updated == 0 {
            self.conn.execute(
                "INSERT INTO session_characters
                    (id, session_id, user_id, character_id, joined_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![SessionCharacterId::generate(), session_id, user, character_id, now],
            )?;
            SelectionAction::Created
        } else {
            SelectionAction::Updated
        };

        let selection = self
            .get(session_id, user)?
            .ok_or_else(|| SessionError::not_found("SessionCharacter", user))?;
        Ok((selection, action))
    }

    pub fn get(
        &self,
        session_id: &SessionId,
        user: &UserId,
    ) -> SessionResult<Option<SessionCharacter>> {
        let selection = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM session_characters WHERE session_id = ?1 AND user_id = ?2",
                    CHARACTER_COLUMNS
                ),
                params![session_id, user],
                character_from_row,
            )
            .optional()?;
        Ok(selection)
    }

    pub fn list_for_session(&self, session_id: &SessionId) -> SessionResult<Vec<SessionCharacter>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM session_characters WHERE session_id = ?1 ORDER BY joined_at, rowid",
            CHARACTER_COLUMNS
        ))?;
        let selections = stmt
            .query_map(params![session_id], character_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(selections)
    }

    /// Drop the user's binding; returns whether one existed
    pub fn clear(&self, session_id: &SessionId, user: &UserId) -> SessionResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM session_characters WHERE session_id = ?1 AND user_id = ?2",
            params![session_id, user],
        )?;
        Ok(removed > 0)
    }
}

fn character_from_row(row: &Row<'_>) -> rusqlite::Result<SessionCharacter> {
    Ok(SessionCharacter {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: row.get(2)?,
        character_id: row.get(3)?,
        joined_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
