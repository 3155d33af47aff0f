//! API-key authentication for the management routes.
//!
//! Accepts the key in an `x-api-key` header or as `Authorization: Bearer`.
//! When auth is disabled in config every request passes through. Shared
//! link routes are never wrapped by this middleware.

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use vl_core::config::AuthConfig;

use crate::context::AppContext;
use crate::error::AppError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Pull the presented key out of the request headers.
pub fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Whether the headers satisfy the auth config.
pub fn is_authorized(auth: &AuthConfig, headers: &HeaderMap) -> bool {
    if !auth.enabled {
        return true;
    }
    match (auth.api_key.as_deref(), presented_key(headers)) {
        (Some(expected), Some(given)) => !expected.is_empty() && constant_time_eq(expected, given),
        _ => false,
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authentication middleware. Applied to protected routes only.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_authorized(&ctx.config.auth, request.headers()) {
        return next.run(request).await;
    }
    tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
    AppError::new(vl_core::Error::Unauthorized("missing or invalid API key".into())).into_response()
}
