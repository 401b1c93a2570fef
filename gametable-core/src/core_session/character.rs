//! Character selection within a session
//!
//! Character sheets live in an external store; sessions only bind a
//! member to one of their own characters.

use super::errors::{SessionError, SessionResult};
use super::types::{CharacterId, SessionCharacterId, SessionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// A member's active character in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCharacter {
    pub id: SessionCharacterId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub character_id: CharacterId,
    pub joined_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Outcome of a character selection upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionAction {
    Created,
    Updated,
}

/// Reference to an externally owned character sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRef {
    pub id: CharacterId,
    pub owner: UserId,
    pub name: String,
}

/// Lookup interface onto the external character store
pub trait CharacterDirectory: Send + Sync {
    /// Return the character only if it exists and belongs to `owner`
    fn get_character(
        &self,
        id: &CharacterId,
        owner: &UserId,
    ) -> SessionResult<Option<CharacterRef>>;
}

/// Process-local character directory
#[derive(Debug, Default)]
pub struct InMemoryCharacterDirectory {
    characters: RwLock<HashMap<CharacterId, CharacterRef>>,
}

impl InMemoryCharacterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of `{id, owner, name}` records
    pub fn from_json_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SessionError::Storage(format!(
                "failed to read character file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let records: Vec<CharacterRef> = serde_json::from_str(&contents)
            .map_err(|e| SessionError::Validation(format!("invalid character file: {}", e)))?;

        let directory = Self::new();
        for record in records {
            directory.insert(record)?;
        }
        Ok(directory)
    }

    pub fn insert(&self, character: CharacterRef) -> SessionResult<()> {
        let mut characters = self
            .characters
            .write()
            .map_err(|_| SessionError::Storage("character directory lock poisoned".into()))?;
        characters.insert(character.id.clone(), character);
        Ok(())
    }

    /// Register a new character for `owner` and return its id
    pub fn register(&self, owner: UserId, name: impl Into<String>) -> SessionResult<CharacterId> {
        let id = CharacterId::generate();
        self.insert(CharacterRef {
            id: id.clone(),
            owner,
            name: name.into(),
        })?;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.characters.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CharacterDirectory for InMemoryCharacterDirectory {
    fn get_character(
        &self,
        id: &CharacterId,
        owner: &UserId,
    ) -> SessionResult<Option<CharacterRef>> {
        let characters = self
            .characters
            .read()
            .map_err(|_| SessionError::Storage("character directory lock poisoned".into()))?;
        Ok(characters.get(id).filter(|c| &c.owner == owner).cloned())
    }
}
