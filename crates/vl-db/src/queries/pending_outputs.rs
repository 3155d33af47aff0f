//! Markers for staged transcode outputs.

use chrono::Utc;
use rusqlite::Connection;
use vl_core::{Error, Result};

use crate::models::{format_timestamp, PendingOutput};

/// Record that `path` is about to be produced.
pub fn mark_pending(conn: &Connection, path: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO pending_outputs (path, created_at) VALUES (?1, ?2)",
        rusqlite::params![path, format_timestamp(Utc::now())],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Remove the marker for `path`. Returns whether a row was deleted.
pub fn clear_pending(conn: &Connection, path: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM pending_outputs WHERE path = ?1", [path])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// All outstanding markers, oldest first.
pub fn list_pending(conn: &Connection) -> Result<Vec<PendingOutput>> {
    let mut stmt = conn
        .prepare("SELECT path, created_at FROM pending_outputs ORDER BY created_at")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], PendingOutput::from_row)
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))
}
