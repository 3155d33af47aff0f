//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; every [`vl_core::Error`]
//! converts into [`AppError`] with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id::current_request_id;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: vl_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: vl_core::Error) -> Self {
        Self {
            inner,
            request_id: current_request_id(),
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn inner(&self) -> &vl_core::Error {
        &self.inner
    }
}

impl From<vl_core::Error> for AppError {
    fn from(e: vl_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::debug!(status = %status, error = %self.inner, "request rejected");
        }

        let body = json!({
            "error": self.inner.public_message(),
            "code": self.inner.code(),
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vl_core::Error;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_produces_404() {
        let response = AppError::new(Error::link_unavailable()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_produces_401() {
        let response = AppError::new(Error::Unauthorized("bad key".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn server_errors_hide_detail() {
        let response = AppError::new(Error::transcode("ffmpeg", "/srv/videos/a.mp4: moov atom not found"))
            .with_request_id("req-123".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Video processing failed");
        assert_eq!(body["code"], "transcode_error");
        assert_eq!(body["request_id"], "req-123");
    }

    #[tokio::test]
    async fn validation_message_is_passed_through() {
        let response =
            AppError::new(Error::Validation("End time must be greater than start time".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "End time must be greater than start time");
        assert!(body["request_id"].is_null());
    }
}
