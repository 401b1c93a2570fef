//! Fixtures for service-level tests

use crate::core_session::{
    InMemoryCharacterDirectory, InviteManager, SessionInvite, SessionManager, SessionResult,
    SessionService, SessionSqlStore, UserId,
};
use std::path::Path;
use std::sync::Arc;

/// A service over a private in-memory database
pub struct TestTable {
    pub service: SessionService,
    pub characters: Arc<InMemoryCharacterDirectory>,
}

impl TestTable {
    pub fn memory() -> SessionResult<Self> {
        Self::with_store(SessionSqlStore::memory()?)
    }

    /// Service over a database file, for multi-connection tests
    pub fn file(path: &Path, pool_size: u32) -> SessionResult<Self> {
        let config = crate::config::StoreConfig {
            path: path.to_path_buf(),
            pool_size,
            ..Default::default()
        };
        Self::with_store(SessionSqlStore::open(&config)?)
    }

    fn with_store(store: SessionSqlStore) -> SessionResult<Self> {
        let characters = Arc::new(InMemoryCharacterDirectory::new());
        let service = SessionService::new(store, characters.clone());
        Ok(Self {
            service,
            characters,
        })
    }

    /// Create a session owned by `master` and mint one invite for it
    pub fn session_with_invite(
        &self,
        master: &UserId,
        name: &str,
        max_uses: Option<u32>,
    ) -> SessionResult<SessionInvite> {
        let session = self.service.create_session(master, name, None)?;
        self.service.create_invite(master, &session.id, max_uses, None)
    }
}

/// Users `player-0 .. player-{n-1}`
pub fn players(n: usize) -> Vec<UserId> {
    (0..n).map(|i| UserId::new(format!("player-{}", i))).collect()
}
