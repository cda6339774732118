//! Error types for the vault API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the note does not exist" from "the server returned an unexpected
//! status." All other rejected statuses land in `Http` with the raw status
//! code and body for debugging. [`ErrorKind`] folds the variants into the
//! three failure classes a caller usually branches on.

use thiserror::Error;

/// Errors returned by `Operation::parse`, transports and configuration.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, DNS, TLS, I/O).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound { body: String },

    /// The server returned a status outside the operation's accepted set.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Client configuration is missing or unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse failure class of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Status,
    Decode,
    Config,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::NotFound { .. } | ApiError::Http { .. } => ErrorKind::Status,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status of the rejected response, if the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
