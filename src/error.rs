// Error types for the API clients, the local storage backends and the asset server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Which layer a remote call failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network, // Transport-level failure (connect, timeout, unreadable body)
    Api,     // Server answered but reported `success: false` or a bad status
    Decode,  // Server answered with a body we could not make sense of
}

/// Normalized failure surfaced by the search, detail and catalog clients.
///
/// The `Display` output of the failure variants is the best human-readable
/// message available: the server's `error` field when it sent one, a generic
/// fallback otherwise. Raw transport errors are logged, never returned.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    SearchFailed { kind: FailureKind, message: String },

    #[error("{message}")]
    NotFound { id: i64, message: String },

    #[error("{message}")]
    FetchFailed {
        id: i64,
        kind: FailureKind,
        message: String,
    },

    #[error("{message}")]
    CatalogFailed { kind: FailureKind, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to set up API client: {0}")]
    Setup(String),
}

impl ApiError {
    // The failure layer, if this error came from a remote call
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ApiError::SearchFailed { kind, .. }
            | ApiError::FetchFailed { kind, .. }
            | ApiError::CatalogFailed { kind, .. } => Some(*kind),
            ApiError::NotFound { .. } => Some(FailureKind::Api),
            ApiError::InvalidRequest(_) | ApiError::Setup(_) => None,
        }
    }
}

// Errors raised by a key-value storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

// Application error for the static asset server
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    BadRequest(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here, don't expose it to the client
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::BadRequest(message) => {
                tracing::warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
