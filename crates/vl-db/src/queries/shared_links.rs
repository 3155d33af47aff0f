//! Shared-link operations.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use vl_core::{Error, Result, SharedLinkId, VideoId};

use crate::models::{format_timestamp, is_storable, SharedLink, Video};

/// Persist a new link for `video_id`.
///
/// A duplicate token or unknown video surfaces as a database error. An
/// expiry that cannot be stored in the canonical text form is a
/// validation error and nothing is written.
pub fn create_shared_link(
    conn: &Connection,
    video_id: VideoId,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<SharedLink> {
    if !is_storable(expires_at) {
        return Err(Error::Validation(format!(
            "expiry {expires_at} is outside the storable range"
        )));
    }
    let created_at = format_timestamp(Utc::now());

    conn.execute(
        "INSERT INTO shared_links (link, video_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![token, video_id.get(), format_timestamp(expires_at), created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let id = SharedLinkId::from(conn.last_insert_rowid());
    conn.query_row(
        &format!("SELECT {} FROM shared_links WHERE id = ?1", SharedLink::COLS),
        [id.get()],
        SharedLink::from_row,
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Look up a link by token together with the video it references.
pub fn get_link_with_video(conn: &Connection, token: &str) -> Result<Option<(SharedLink, Video)>> {
    conn.query_row(
        "SELECT l.id, l.link, l.video_id, l.expires_at, l.created_at,
                v.id, v.name, v.size, v.duration, v.path, v.created_at, v.uploaded_at
         FROM shared_links l
         JOIN videos v ON v.id = l.video_id
         WHERE l.link = ?1",
        [token],
        |row| Ok((SharedLink::from_row(row)?, Video::from_row_at(row, 5)?)),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Delete links that expired strictly before `cutoff`. Returns the count.
pub fn delete_expired_links(conn: &Connection, cutoff: DateTime<Utc>) -> Result<usize> {
    conn.execute(
        "DELETE FROM shared_links WHERE expires_at < ?1",
        [format_timestamp(cutoff)],
    )
    .map_err(|e| Error::database(e.to_string()))
}
