//! HTTP middleware: request ID and API-key authentication.

pub mod auth;
pub mod request_id;
