//! Video management routes: upload, trim, merge.

use axum::extract::multipart::Field;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use vl_av::ArtifactGuard;
use vl_core::{Error, VideoId};
use vl_db::models::Video;

use crate::context::AppContext;
use crate::error::AppError;
use crate::lifecycle::StagedUpload;
use crate::routes::json_body;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "video";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: VideoId,
    pub name: String,
    pub size: i64,
    pub duration: i64,
    pub created_at: DateTime<Utc>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(v: Video) -> Self {
        Self {
            id: v.id,
            name: v.name,
            size: v.size,
            duration: v.duration,
            created_at: v.created_at,
            uploaded_at: v.uploaded_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimRequest {
    pub video_id: VideoId,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub video_ids: Vec<VideoId>,
}

fn is_mp4(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    Error::Validation(format!("Invalid upload: {}", e.body_text())).into()
}

/// POST /videos/upload -- multipart with a single `video` file field.
pub async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| Error::Validation("No file uploaded".into()))?;
        if !is_mp4(&original_name) {
            return Err(Error::Validation("Only .mp4 files are allowed".into()).into());
        }

        let staged = stage_field(&ctx, field, original_name).await?;
        let video = ctx.lifecycle.upload(staged).await?;
        return Ok((StatusCode::CREATED, Json(video.into())));
    }

    Err(Error::Validation("No file uploaded".into()).into())
}

/// Stream a multipart field into `staging/`, enforcing the size limit.
async fn stage_field(
    ctx: &AppContext,
    mut field: Field<'_>,
    original_name: String,
) -> Result<StagedUpload, AppError> {
    let max_bytes = ctx.config.storage.max_upload_bytes();
    let guard = ArtifactGuard::new(ctx.storage().staging_file("upload-"));

    let mut file = tokio::fs::File::create(guard.path())
        .await
        .map_err(Error::from)?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_bytes {
            return Err(Error::Validation(format!(
                "File too large. Maximum size is {} MB",
                ctx.config.storage.max_upload_mb
            ))
            .into());
        }
        file.write_all(&chunk).await.map_err(Error::from)?;
    }
    file.flush().await.map_err(Error::from)?;
    drop(file);

    if size == 0 {
        return Err(Error::Validation("No file uploaded".into()).into());
    }

    tracing::debug!(name = %original_name, size, "upload staged");
    Ok(StagedUpload {
        path: guard.keep(),
        original_name,
        size,
    })
}

/// POST /videos/trim
pub async fn trim(
    State(ctx): State<AppContext>,
    payload: Result<Json<TrimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let req = json_body(payload)?;
    let video = ctx.lifecycle.trim(req.video_id, req.start, req.end).await?;
    Ok((StatusCode::CREATED, Json(video.into())))
}

/// POST /videos/merge
pub async fn merge(
    State(ctx): State<AppContext>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let req = json_body(payload)?;
    let video = ctx.lifecycle.merge(&req.video_ids).await?;
    Ok((StatusCode::CREATED, Json(video.into())))
}
