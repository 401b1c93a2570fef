//! SQLite connection pool and transaction runner for the session stores

use super::super::errors::SessionResult;
use crate::config::StoreConfig;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled SQLite backend shared by the membership, invite and character stores
#[derive(Clone)]
pub struct SessionSqlStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SessionSqlStore {
    /// Wrap an existing pool and run pending migrations
    pub fn new(pool: Pool<SqliteConnectionManager>) -> SessionResult<Self> {
        super::migrations::migrate(&pool)?;
        Ok(Self { pool })
    }

    /// Open (or create) the database file named in `config`
    pub fn open(config: &StoreConfig) -> SessionResult<Self> {
        debug!(
            path = %config.path.display(),
            pool_size = config.pool_size,
            "opening session store"
        );

        let manager = configure(SqliteConnectionManager::file(&config.path), config.busy_timeout);
        let pool = Pool::builder().max_size(config.pool_size).build(manager)?;
        Self::new(pool)
    }

    /// Private in-memory database.
    ///
    /// Every SQLite memory connection is its own database, so the pool holds
    /// exactly one connection.
    pub fn memory() -> SessionResult<Self> {
        let manager = configure(SqliteConnectionManager::memory(), DEFAULT_BUSY_TIMEOUT);
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::new(pool)
    }

    /// Run `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits only when `f` returns `Ok`; any error rolls it
    /// back. `f` must not reach back into the pool.
    pub fn with_transaction<T, F>(&self, f: F) -> SessionResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> SessionResult<T>,
    {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn pool(&self) -> &Pool<SqliteConnectionManager> {
        &self.pool
    }
}

fn configure(manager: SqliteConnectionManager, busy_timeout: Duration) -> SqliteConnectionManager {
    manager.with_init(move |conn: &mut Connection| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(busy_timeout)
    })
}
