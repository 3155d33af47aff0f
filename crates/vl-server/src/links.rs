//! Time-limited shared links.
//!
//! A link is a random token bound to one video with an expiry. There is no
//! revoke: a link stays active until the clock passes `expires_at`, then
//! resolves exactly like a token that never existed.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use vl_core::{Error, Result, VideoId};
use vl_db::models::{is_storable, Video};
use vl_db::pool::{get_conn, DbPool};
use vl_db::queries::{shared_links, videos};

use crate::storage::Storage;

/// Random bytes per token (hex-encoded to twice as many characters).
pub const TOKEN_BYTES: usize = 32;

/// Result of [`LinkManager::issue`].
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedLink {
    /// Public URL, `<base>/stream/<token>`.
    pub link: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// The public view of a shared video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub id: VideoId,
    pub name: String,
    pub size: i64,
    pub duration: i64,
}

impl From<&Video> for VideoSummary {
    fn from(v: &Video) -> Self {
        Self {
            id: v.id,
            name: v.name.clone(),
            size: v.size,
            duration: v.duration,
        }
    }
}

/// A file ready to be streamed for a shared link.
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

/// Generate a fresh token from the OS CSPRNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Clone)]
pub struct LinkManager {
    db: DbPool,
    storage: Storage,
}

impl LinkManager {
    pub fn new(db: DbPool, storage: Storage) -> Self {
        Self { db, storage }
    }

    /// Issue a link valid for `expires_in_hours` from now.
    pub fn issue(&self, video_id: VideoId, expires_in_hours: i64, base_url: &str) -> Result<IssuedLink> {
        self.issue_at(video_id, expires_in_hours, base_url, Utc::now())
    }

    pub fn issue_at(
        &self,
        video_id: VideoId,
        expires_in_hours: i64,
        base_url: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedLink> {
        if expires_in_hours < 1 {
            return Err(Error::Validation(
                "Expiration time must be at least 1 hour".into(),
            ));
        }
        let expires_at = Duration::try_hours(expires_in_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .filter(|t| is_storable(*t))
            .ok_or_else(|| Error::Validation("Expiration time is too large".into()))?;

        let conn = get_conn(&self.db)?;
        if videos::get_video(&conn, video_id)?.is_none() {
            return Err(Error::NotFound("Video not found".into()));
        }

        let token = generate_token();
        let link = shared_links::create_shared_link(&conn, video_id, &token, expires_at)?;
        tracing::info!(%video_id, link_id = %link.id, expires_at = %link.expires_at, "shared link issued");

        Ok(IssuedLink {
            link: format!("{}/stream/{token}", base_url.trim_end_matches('/')),
            token,
            expires_at: link.expires_at,
        })
    }

    /// Summary of the video behind an active link.
    pub fn resolve(&self, token: &str) -> Result<VideoSummary> {
        self.resolve_at(token, Utc::now())
    }

    /// [`LinkManager::resolve`] against an explicit clock.
    pub fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<VideoSummary> {
        self.lookup(token, now).map(|v| VideoSummary::from(&v))
    }

    /// Locate the file behind an active link.
    pub async fn stream(&self, token: &str) -> Result<StreamTarget> {
        let video = self.lookup(token, Utc::now())?;
        let path = self.storage.resolve(&video.path)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(StreamTarget {
                path,
                name: video.name,
                size: meta.len(),
            }),
            _ => {
                tracing::warn!(video_id = %video.id, path = %path.display(), "shared video file missing");
                Err(Error::NotFound("Video file not found.".into()))
            }
        }
    }

    /// Delete links that expired before `cutoff`.
    pub fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = get_conn(&self.db)?;
        let removed = shared_links::delete_expired_links(&conn, cutoff)?;
        tracing::info!(removed, %cutoff, "pruned expired links");
        Ok(removed)
    }

    fn lookup(&self, token: &str, now: DateTime<Utc>) -> Result<Video> {
        if !is_well_formed(token) {
            tracing::debug!("shared link rejected: malformed token");
            return Err(Error::link_unavailable());
        }

        let conn = get_conn(&self.db)?;
        match shared_links::get_link_with_video(&conn, token)? {
            None => {
                tracing::debug!("shared link rejected: unknown token");
                Err(Error::link_unavailable())
            }
            Some((link, _)) if link.is_expired_at(now) => {
                tracing::debug!(link_id = %link.id, expires_at = %link.expires_at, "shared link rejected: expired");
                Err(Error::link_unavailable())
            }
            Some((_, video)) => Ok(video),
        }
    }
}
