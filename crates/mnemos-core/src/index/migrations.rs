//! Embedding Store Migrations
//!
//! Schema migration definitions for the embedding index.

use rusqlite::Connection;

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: per-note vectors with content fingerprint",
    up: MIGRATION_V1_UP,
}];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: one row per note, five vector blobs, fingerprint, timestamp
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS note_embeddings (
    title TEXT PRIMARY KEY,
    title_vec BLOB NOT NULL,
    desc_vec BLOB NOT NULL,
    body_vec BLOB NOT NULL,
    type_vec BLOB NOT NULL,
    community_vec BLOB NOT NULL,
    content_hash TEXT NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_note_embeddings_hash
    ON note_embeddings(content_hash);
"#;

/// Apply any migrations newer than the stored schema version
pub fn apply_migrations(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "applying embedding store migration"
        );
        conn.execute_batch(migration.up)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.description,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
    }

    Ok(())
}
