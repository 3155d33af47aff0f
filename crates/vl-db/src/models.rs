//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`. Timestamps are stored as RFC 3339 UTC text with a fixed
//! precision so that string comparison in SQL matches chronological order.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use vl_core::{SharedLinkId, VideoId};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Render a timestamp in the canonical stored form.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Latest year the canonical form can hold. RFC 3339 years are four
/// digits; later years would be written with a sign and fail to parse.
pub const MAX_STORABLE_YEAR: i32 = 9999;

/// Whether `ts` round-trips through [`format_timestamp`] and keeps
/// lexicographic order.
pub fn is_storable(ts: DateTime<Utc>) -> bool {
    (0..=MAX_STORABLE_YEAR).contains(&ts.year())
}

/// Parse an RFC 3339 timestamp from a text column.
fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// A stored video. Rows are never updated once written.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: VideoId,
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Duration in whole seconds.
    pub duration: i64,
    /// Storage-relative locator of the bytes.
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
}

impl Video {
    /// Column list matching [`Video::from_row_at`] with offset 0.
    pub const COLS: &'static str = "id, name, size, duration, path, created_at, uploaded_at";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Self::from_row_at(row, 0)
    }

    /// Build from a row where the video columns start at `offset` (joins).
    pub fn from_row_at(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: VideoId::from(row.get::<_, i64>(offset)?),
            name: row.get(offset + 1)?,
            size: row.get(offset + 2)?,
            duration: row.get(offset + 3)?,
            path: row.get(offset + 4)?,
            created_at: parse_timestamp(row, offset + 5)?,
            uploaded_at: parse_timestamp(row, offset + 6)?,
        })
    }
}

/// Fields for a video row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub name: String,
    pub size: i64,
    pub duration: i64,
    pub path: String,
}

// ---------------------------------------------------------------------------
// SharedLink
// ---------------------------------------------------------------------------

/// A time-limited public token referencing one video.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedLink {
    pub id: SharedLinkId,
    pub link: String,
    pub video_id: VideoId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SharedLink {
    pub const COLS: &'static str = "id, link, video_id, expires_at, created_at";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: SharedLinkId::from(row.get::<_, i64>(0)?),
            link: row.get(1)?,
            video_id: VideoId::from(row.get::<_, i64>(2)?),
            expires_at: parse_timestamp(row, 3)?,
            created_at: parse_timestamp(row, 4)?,
        })
    }

    /// Whether the link is inert at `now`. A link is still valid at exactly
    /// `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// ---------------------------------------------------------------------------
// PendingOutput
// ---------------------------------------------------------------------------

/// Marker for a transcode output whose video row has not been committed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOutput {
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl PendingOutput {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            created_at: parse_timestamp(row, 1)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn storable_range_ends_at_year_9999() {
        let last = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
        assert!(is_storable(last));
        assert_eq!(format_timestamp(last), "9999-12-31T23:59:59.000Z");
        assert!(!is_storable(last + Duration::seconds(1)));
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let a = Utc.with_ymd_and_hms(2024, 1, 9, 23, 59, 59).unwrap();
        let b = a + Duration::milliseconds(1);
        assert!(format_timestamp(a) < format_timestamp(b));
        assert!(format_timestamp(a).ends_with('Z'));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let expires_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let link = SharedLink {
            id: SharedLinkId::from(1),
            link: "abc".into(),
            video_id: VideoId::from(1),
            expires_at,
            created_at: expires_at - Duration::hours(1),
        };
        assert!(!link.is_expired_at(expires_at));
        assert!(link.is_expired_at(expires_at + Duration::seconds(1)));
    }
}
