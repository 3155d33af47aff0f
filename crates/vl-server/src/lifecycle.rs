//! Video lifecycle: upload validation, trim and merge.
//!
//! Every new video goes through the same staged write:
//!
//! 1. a `pending_outputs` marker is recorded for the final locator,
//! 2. bytes are produced under `staging/`,
//! 3. the file is renamed into `videos/`,
//! 4. the video row is inserted and the marker deleted in one transaction.
//!
//! Any failure before step 4 commits removes the file and the marker. A
//! crash in between leaves a marker that startup reconciliation resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vl_av::{ArtifactGuard, Transcoder};
use vl_core::config::LimitsConfig;
use vl_core::{Error, Result, VideoId};
use vl_db::models::{NewVideo, Video};
use vl_db::pool::{get_conn, DbPool};
use vl_db::queries::{pending_outputs, videos};

use crate::storage::Storage;

/// Suffix appended to the source name of a trimmed video.
pub const TRIMMED_SUFFIX: &str = "_trimmed";

/// Name given to every merged video.
pub const MERGED_NAME: &str = "Merged Video";

/// An uploaded file already written to staging by the HTTP layer.
#[derive(Debug, Clone)]
pub struct StagedUpload {
    pub path: PathBuf,
    pub original_name: String,
    pub size: u64,
}

/// A locator with an outstanding marker and the staged bytes it will hold.
struct PendingWrite {
    locator: String,
    guard: ArtifactGuard,
}

/// Coordinates the transcoder, storage and metadata store.
#[derive(Clone)]
pub struct VideoLifecycle {
    db: DbPool,
    storage: Storage,
    transcoder: Arc<dyn Transcoder>,
    limits: LimitsConfig,
}

impl VideoLifecycle {
    pub fn new(
        db: DbPool,
        storage: Storage,
        transcoder: Arc<dyn Transcoder>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            db,
            storage,
            transcoder,
            limits,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn duration_error(&self) -> Error {
        Error::Validation(format!(
            "Video duration must be between {} and {} seconds.",
            self.limits.min_duration_secs, self.limits.max_duration_secs
        ))
    }

    /// Validate and persist an uploaded file.
    ///
    /// The staged bytes are removed on every path except success.
    pub async fn upload(&self, upload: StagedUpload) -> Result<Video> {
        let staged = ArtifactGuard::new(&upload.path);

        let duration = match self.transcoder.probe_duration(&upload.path).await {
            Ok(d) => d,
            Err(Error::Probe(reason)) => {
                tracing::info!(name = %upload.original_name, %reason, "upload rejected: probe failed");
                return Err(self.duration_error());
            }
            Err(e) => return Err(e),
        };

        if !self.limits.accepts(duration) {
            tracing::info!(name = %upload.original_name, duration, "upload rejected: duration out of range");
            return Err(self.duration_error());
        }

        let size = i64::try_from(upload.size)
            .map_err(|_| Error::Validation("Uploaded file is too large".into()))?;
        if size == 0 {
            return Err(Error::Validation("Uploaded file is empty".into()));
        }

        let pending = self.begin_write(staged)?;
        let video = self
            .finish_write(pending, upload.original_name, size, duration.round() as i64)
            .await?;
        tracing::info!(video_id = %video.id, duration = video.duration, "video uploaded");
        Ok(video)
    }

    /// Extract `[start, end)` seconds of a stored video into a new video.
    pub async fn trim(&self, video_id: VideoId, start: i64, end: i64) -> Result<Video> {
        let source = self.load(video_id)?;
        validate_range(start, end, source.duration)?;
        let input = self.storage.resolve(&source.path)?;

        let pending = self.begin_write(ArtifactGuard::new(self.storage.staging_file("trim-")))?;
        if let Err(e) = self
            .transcoder
            .trim(&input, start, end, pending.guard.path())
            .await
        {
            tracing::warn!(%video_id, "trim failed: {e}");
            self.abandon_write(pending);
            return Err(e);
        }

        let size = match output_size(pending.guard.path()).await {
            Ok(size) => size,
            Err(e) => {
                self.abandon_write(pending);
                return Err(e);
            }
        };

        let video = self
            .finish_write(
                pending,
                format!("{}{TRIMMED_SUFFIX}", source.name),
                size,
                end - start,
            )
            .await?;
        tracing::info!(source_id = %video_id, video_id = %video.id, start, end, "video trimmed");
        Ok(video)
    }

    /// Concatenate stored videos, in the given order, into a new video.
    ///
    /// Ids may repeat; a repeated id contributes its file, duration and size
    /// once per occurrence. The resulting size is the sum of the input sizes.
    pub async fn merge(&self, video_ids: &[VideoId]) -> Result<Video> {
        if video_ids.len() < 2 {
            return Err(Error::Validation(
                "At least two videos are required to merge".into(),
            ));
        }

        let mut distinct = video_ids.to_vec();
        distinct.sort();
        distinct.dedup();

        let found = {
            let conn = get_conn(&self.db)?;
            videos::find_videos_by_ids(&conn, &distinct)?
        };
        if found.len() != distinct.len() {
            return Err(Error::NotFound("One or more videos not found".into()));
        }
        let by_id: HashMap<VideoId, Video> = found.into_iter().map(|v| (v.id, v)).collect();

        let mut inputs = Vec::with_capacity(video_ids.len());
        let mut duration = 0i64;
        let mut size = 0i64;
        for id in video_ids {
            let video = by_id
                .get(id)
                .ok_or_else(|| Error::NotFound("One or more videos not found".into()))?;
            inputs.push(self.storage.resolve(&video.path)?);
            duration += video.duration;
            size += video.size;
        }

        let pending = self.begin_write(ArtifactGuard::new(self.storage.staging_file("merge-")))?;
        if let Err(e) = self.transcoder.merge(&inputs, pending.guard.path()).await {
            tracing::warn!(inputs = inputs.len(), "merge failed: {e}");
            self.abandon_write(pending);
            return Err(e);
        }

        let video = self
            .finish_write(pending, MERGED_NAME.to_string(), size, duration)
            .await?;
        tracing::info!(video_id = %video.id, inputs = video_ids.len(), duration, "videos merged");
        Ok(video)
    }

    fn load(&self, video_id: VideoId) -> Result<Video> {
        let conn = get_conn(&self.db)?;
        videos::get_video(&conn, video_id)?.ok_or_else(|| Error::NotFound("Video not found".into()))
    }

    fn begin_write(&self, guard: ArtifactGuard) -> Result<PendingWrite> {
        let locator = self.storage.new_video_locator();
        let conn = get_conn(&self.db)?;
        pending_outputs::mark_pending(&conn, &locator)?;
        Ok(PendingWrite { locator, guard })
    }

    async fn finish_write(
        &self,
        pending: PendingWrite,
        name: String,
        size: i64,
        duration: i64,
    ) -> Result<Video> {
        let PendingWrite { locator, mut guard } = pending;

        let committed = async {
            let dest = self.storage.promote(guard.path(), &locator).await?;
            guard.relocate(dest);

            let conn = get_conn(&self.db)?;
            videos::create_video_from_pending(
                &conn,
                &NewVideo {
                    name,
                    size,
                    duration,
                    path: locator.clone(),
                },
            )
        }
        .await;

        match committed {
            Ok(video) => {
                guard.keep();
                Ok(video)
            }
            Err(e) => {
                self.clear_marker(&locator);
                Err(e)
            }
        }
    }

    fn abandon_write(&self, pending: PendingWrite) {
        self.clear_marker(&pending.locator);
    }

    fn clear_marker(&self, locator: &str) {
        let cleared = get_conn(&self.db).and_then(|conn| pending_outputs::clear_pending(&conn, locator));
        if let Err(e) = cleared {
            tracing::warn!(path = locator, "failed to clear pending marker: {e}");
        }
    }
}

/// `0 <= start < end <= duration`.
pub fn validate_range(start: i64, end: i64, duration: i64) -> Result<()> {
    if start < 0 {
        return Err(Error::Validation(
            "Start Time must be at least 0 seconds".into(),
        ));
    }
    if end <= start {
        return Err(Error::Validation(
            "End time must be greater than start time".into(),
        ));
    }
    if end > duration {
        return Err(Error::Validation(format!(
            "End time must not exceed the video duration ({duration} seconds)"
        )));
    }
    Ok(())
}

async fn output_size(path: &Path) -> Result<i64> {
    let len = tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    if len == 0 {
        return Err(Error::transcode("ffmpeg", "produced no output"));
    }
    i64::try_from(len).map_err(|_| Error::Internal(format!("output too large: {len} bytes")))
}
