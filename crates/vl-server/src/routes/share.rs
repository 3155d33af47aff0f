//! Shared link routes: issue (protected) and access (public).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vl_core::VideoId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::links::VideoSummary;
use crate::routes::json_body;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub video_id: VideoId,
    pub expires_in_hours: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SharedVideoResponse {
    pub video: VideoSummary,
}

/// Base URL for links: the configured public URL, else derived from `Host`.
pub fn base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(url) = configured.filter(|u| !u.is_empty()) {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// POST /videos/share
pub async fn create_link(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    let req = json_body(payload)?;
    let base = base_url(ctx.config.server.public_base_url.as_deref(), &headers);
    let issued = ctx.links.issue(req.video_id, req.expires_in_hours, &base)?;

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            link: issued.link,
            expires_at: issued.expires_at,
        }),
    ))
}

/// GET /videos/shared/{token}
pub async fn access_link(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> Result<Json<SharedVideoResponse>, AppError> {
    let video = ctx.links.resolve(&token)?;
    Ok(Json(SharedVideoResponse { video }))
}
