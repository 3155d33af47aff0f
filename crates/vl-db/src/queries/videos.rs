//! Video CRUD operations.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use vl_core::{Error, Result, VideoId};

use crate::models::{format_timestamp, NewVideo, Video};

fn insert(conn: &Connection, new: &NewVideo) -> Result<Video> {
    let now = Utc::now();
    let ts = format_timestamp(now);

    conn.execute(
        "INSERT INTO videos (name, size, duration, path, created_at, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![new.name, new.size, new.duration, new.path, ts, ts],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let id = VideoId::from(conn.last_insert_rowid());
    get_video(conn, id)?.ok_or_else(|| Error::Internal(format!("video {id} vanished after insert")))
}

/// Insert a new video row and return it with its assigned id.
pub fn create_video(conn: &Connection, new: &NewVideo) -> Result<Video> {
    insert(conn, new)
}

/// Insert a video for a staged transcode output and clear its pending
/// marker in the same transaction.
pub fn create_video_from_pending(conn: &Connection, new: &NewVideo) -> Result<Video> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let video = insert(&tx, new)?;
    tx.execute(
        "DELETE FROM pending_outputs WHERE path = ?1",
        rusqlite::params![new.path],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    Ok(video)
}

/// Get a video by ID.
pub fn get_video(conn: &Connection, id: VideoId) -> Result<Option<Video>> {
    conn.query_row(
        &format!("SELECT {} FROM videos WHERE id = ?1", Video::COLS),
        [id.get()],
        Video::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Fetch every video whose id appears in `ids`, in a single query.
///
/// The result is keyed by nothing in particular; callers match rows back to
/// ids themselves. Unknown ids are simply absent.
pub fn find_videos_by_ids(conn: &Connection, ids: &[VideoId]) -> Result<Vec<Video>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM videos WHERE id IN ({placeholders})",
        Video::COLS
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(
            rusqlite::params_from_iter(ids.iter().map(|id| id.get())),
            Video::from_row,
        )
        .map_err(|e| Error::database(e.to_string()))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))
}

/// Whether any video row references the given storage path.
pub fn is_path_referenced(conn: &Connection, path: &str) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM videos WHERE path = ?1",
        [path],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Total number of stored videos.
pub fn count_videos(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
