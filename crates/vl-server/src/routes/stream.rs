//! Public byte streaming for shared links.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::streaming_helpers::serve_file_streaming;

/// GET /stream/{token}
///
/// Supports single `Range` requests.
pub async fn stream_shared(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = ctx.links.stream(&token).await?;
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    Ok(serve_file_streaming(&target, range).await?)
}
