//! Database migrations for sessions, members, invites and character bindings
//!
//! Each migration is applied atomically and tracked in the
//! `session_schema_version` table.

use super::super::errors::SessionResult;
use super::super::types::Timestamp;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

/// Current schema version for core_session
pub const CURRENT_SESSION_SCHEMA_VERSION: i32 = 1;

/// Migration descriptor
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All available migrations in order
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial sessions, members, invites and characters schema",
        up_sql: r#"
            -- Game sessions (tables)
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,                    -- SessionId (uuid)
                master_id TEXT NOT NULL,                -- UserId
                name TEXT NOT NULL CHECK(length(name) BETWEEN 1 AND 150),
                description TEXT,
                status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK(status IN ('ACTIVE', 'ARCHIVED')),
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_master ON sessions(master_id);

            -- Session members, one role per user per session
            CREATE TABLE IF NOT EXISTS session_members (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('MASTER', 'PLAYER')),
                joined_at INTEGER NOT NULL,
                UNIQUE (session_id, user_id),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_session_members_user ON session_members(user_id);

            -- Invite codes with optional usage and time limits
            CREATE TABLE IF NOT EXISTS session_invites (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                code TEXT NOT NULL UNIQUE CHECK(length(code) BETWEEN 1 AND 20),
                max_uses INTEGER CHECK(max_uses IS NULL OR max_uses > 0),
                uses_count INTEGER NOT NULL DEFAULT 0
                    CHECK(uses_count >= 0 AND (max_uses IS NULL OR uses_count <= max_uses)),
                expires_at INTEGER,
                created_by TEXT NOT NULL,               -- UserId of the master
                created_at INTEGER NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_invites_session ON session_invites(session_id);

            -- Active character per user per session
            CREATE TABLE IF NOT EXISTS session_characters (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                character_id TEXT NOT NULL,             -- owned by the external character store
                joined_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (session_id, user_id),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );
        "#,
    }]
}

fn ensure_version_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get current schema version from database
pub fn get_current_version(conn: &Connection) -> rusqlite::Result<i32> {
    ensure_version_table(conn)?;

    let version: Option<i32> = conn
        .query_row(
            "SELECT version FROM session_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version.unwrap_or(0))
}

/// Run all pending migrations
pub fn migrate(pool: &Pool<SqliteConnectionManager>) -> SessionResult<()> {
    let conn = pool.get()?;
    let current_version = get_current_version(&conn)?;

    for migration in get_migrations().into_iter().filter(|m| m.version > current_version) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.up_sql)?;
        tx.execute(
            "INSERT INTO session_schema_version (version, applied_at) VALUES (?1, ?2)",
            params![migration.version, Timestamp::now()],
        )?;
        tx.commit()?;

        info!(
            version = migration.version,
            description = migration.description,
            "applied session schema migration"
        );
    }

    Ok(())
}

/// Get the latest migration version available
pub fn get_latest_version() -> i32 {
    get_migrations().iter().map(|m| m.version).max().unwrap_or(0)
}
