//! Route handlers for the HTTP API.

pub mod health;
pub mod share;
pub mod stream;
pub mod streaming_helpers;
pub mod videos;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Turn a JSON body rejection into a 400 with the standard error body.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| vl_core::Error::Validation(rejection.body_text()).into())
}
