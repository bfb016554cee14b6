//! Error types for the catalog client and store.
//!
//! # Design
//! Every failure the list screen can show is one `ApiError` variant. The
//! `Display` text is the message surfaced on the store's `error` field, while
//! `ErrorKind` lets callers branch on the category without matching strings.
//! A 404 from the list endpoint never becomes an error; it is parsed as an
//! empty page so "nothing matches the filter" stays distinct from failures.

use serde::{Deserialize, Serialize};

/// Errors returned by `CatalogClient`, `CatalogService` and the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request did not complete within its timeout.
    #[error("Network error. Please check your internet connection.")]
    Timeout,

    /// The server returned a non-success status other than 404.
    #[error("HTTP Error: {status}")]
    Http { status: u16, body: String },

    /// The requested character does not exist.
    #[error("Character not found")]
    NotFound,

    /// The body did not have the expected shape.
    #[error("Invalid API response structure: {0}")]
    MalformedResponse(String),

    /// The host reported no connectivity, so no request was issued.
    #[error("No internet connection. Please check your connection and try again.")]
    ConnectivityUnavailable,

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("Network error. Please check your internet connection.")]
    Transport(String),

    /// Rejected before any request was built.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Copyable discriminant of `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Http,
    NotFound,
    MalformedResponse,
    ConnectivityUnavailable,
    Transport,
    InvalidArgument,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Timeout => ErrorKind::Timeout,
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::NotFound => ErrorKind::NotFound,
            ApiError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ApiError::ConnectivityUnavailable => ErrorKind::ConnectivityUnavailable,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// HTTP status associated with the error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Failures of the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
