//! Unified error type for vidlink.
//!
//! Every store, transcoder and orchestration failure is mapped into [`Error`]
//! before it reaches the HTTP layer, which derives a status code via
//! [`Error::http_status`] and a caller-safe message via
//! [`Error::public_message`].

use std::fmt;

/// Message shared by every "missing or expired" shared-link lookup.
pub const LINK_UNAVAILABLE: &str = "Link expired or invalid";

/// Unified error type covering all failure modes in vidlink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A media file's duration could not be determined.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The requested entity is missing (or, for shared links, expired).
    #[error("{0}")]
    NotFound(String),

    /// The caller did not present valid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The external engine (ffmpeg/ffprobe) failed.
    #[error("Transcode error [{tool}]: {message}")]
    Transcode {
        /// Name of the tool that failed.
        tool: String,
        /// Diagnostic output from the engine.
        message: String,
    },

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Probe(_) => 400,
            Error::NotFound(_) => 404,
            Error::Unauthorized(_) => 401,
            Error::Transcode { .. } => 500,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Probe(_) => "probe_error",
            Error::NotFound(_) => "not_found",
            Error::Unauthorized(_) => "unauthorized",
            Error::Transcode { .. } => "transcode_error",
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to show to API callers.
    ///
    /// Server-side failures never expose engine output, SQL, or paths.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::Probe(msg) => msg.clone(),
            Error::NotFound(msg) => msg.clone(),
            Error::Unauthorized(_) => "Authentication required".into(),
            Error::Transcode { .. } => "Video processing failed".into(),
            Error::Database { .. } | Error::Io { .. } | Error::Internal(_) => {
                "Internal server error".into()
            }
        }
    }

    /// Convenience constructor for a missing entity.
    pub fn not_found(entity: impl fmt::Display, id: impl fmt::Display) -> Self {
        Error::NotFound(format!("{entity} not found: {id}"))
    }

    /// The single error returned for both unknown and expired shared links.
    pub fn link_unavailable() -> Self {
        Error::NotFound(LINK_UNAVAILABLE.into())
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transcode {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
