//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Per-user voice settings
        CREATE TABLE IF NOT EXISTS voice_preferences (
            user_id TEXT PRIMARY KEY,
            language TEXT NOT NULL DEFAULT 'auto',
            voice_gender TEXT NOT NULL DEFAULT 'female'
                CHECK(voice_gender IN ('male', 'female', 'neutral')),
            speaking_rate REAL NOT NULL DEFAULT 1.0,
            pitch REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        PRAGMA user_version = 1;
        ",
    )?;

    tracing::info!("migrated to schema v1");
    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Understood utterances, text or voice
        CREATE TABLE IF NOT EXISTS voice_interactions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            transcript TEXT NOT NULL,
            language TEXT NOT NULL CHECK(language IN ('urdu', 'english')),
            language_code TEXT,
            intent TEXT NOT NULL,
            intent_confidence TEXT NOT NULL,
            entities TEXT NOT NULL DEFAULT '{}',
            stt_confidence REAL,
            reply TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_voice_interactions_user
            ON voice_interactions(user_id, created_at);

        PRAGMA user_version = 2;
        ",
    )?;

    tracing::info!("migrated to schema v2");
    Ok(())
}
