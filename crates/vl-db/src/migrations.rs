//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.

use rusqlite::Connection;
use vl_core::{Error, Result};

/// V1: initial schema -- videos and their shared links.
const V1_INITIAL: &str = r#"
CREATE TABLE videos (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    size        INTEGER NOT NULL CHECK (size > 0),
    duration    INTEGER NOT NULL CHECK (duration >= 0),
    path        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE TABLE shared_links (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    link       TEXT NOT NULL UNIQUE,
    video_id   INTEGER NOT NULL REFERENCES videos(id),
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX idx_shared_links_video ON shared_links(video_id);
"#;

/// V2: staged-write markers for transcode outputs that are not yet
/// referenced by a video row.
const V2_PENDING_OUTPUTS: &str = r#"
CREATE TABLE pending_outputs (
    path       TEXT PRIMARY KEY,
    created_at TEXT NOT NULL
);
CREATE INDEX idx_shared_links_expires ON shared_links(expires_at);
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[(1, V1_INITIAL), (2, V2_PENDING_OUTPUTS)];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))?;
    }

    Ok(())
}
