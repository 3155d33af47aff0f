//! Range parsing and chunked file serving via `ReaderStream`.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use vl_core::Error;

use crate::links::StreamTarget;

const CHUNK_SIZE: usize = 64 * 1024;
const VIDEO_MP4: &str = "video/mp4";

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`. Suffix and multi-range forms are not supported and
/// yield `None`, which callers treat as "no range".
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let bytes_prefix = value.strip_prefix("bytes=")?;
    let mut parts = bytes_prefix.splitn(2, '-');
    let start_str = parts.next()?.trim();
    let end_str = parts.next()?.trim();

    let start: u64 = start_str.parse().ok()?;
    let end: Option<u64> = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

/// `inline; filename="<name>"` with characters that would break the header
/// replaced.
pub fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!("inline; filename=\"{safe}\"")
}

fn open_failed(target: &StreamTarget, e: std::io::Error) -> Error {
    tracing::warn!(path = %target.path.display(), "failed to open shared video: {e}");
    Error::NotFound("Video file not found.".into())
}

/// Serve a file using chunked streaming. Memory stays bounded regardless of
/// file size.
pub async fn serve_file_streaming(
    target: &StreamTarget,
    range_header: Option<&str>,
) -> Result<Response, Error> {
    let file_size = target.size;
    let disposition = content_disposition(&target.name);

    let mut file = tokio::fs::File::open(&target.path)
        .await
        .map_err(|e| open_failed(target, e))?;

    match range_header.and_then(parse_range_header) {
        Some((start, end_opt)) => {
            if file_size == 0 || start >= file_size || end_opt.is_some_and(|e| e < start) {
                return Ok((
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    [(
                        header::CONTENT_RANGE.as_str(),
                        format!("bytes */{file_size}"),
                    )],
                    Body::empty(),
                )
                    .into_response());
            }
            let end = end_opt.unwrap_or(file_size - 1).min(file_size - 1);
            let length = end - start + 1;

            file.seek(std::io::SeekFrom::Start(start)).await?;
            let body = Body::from_stream(ReaderStream::with_capacity(file.take(length), CHUNK_SIZE));

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE.as_str(), VIDEO_MP4.to_string()),
                    (header::CONTENT_DISPOSITION.as_str(), disposition),
                    (
                        header::CONTENT_RANGE.as_str(),
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::CONTENT_LENGTH.as_str(), length.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
        None => {
            let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE.as_str(), VIDEO_MP4.to_string()),
                    (header::CONTENT_DISPOSITION.as_str(), disposition),
                    (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
    }
}
