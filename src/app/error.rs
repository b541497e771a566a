use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Response decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FolioError>;

pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please check your internet connection.";
pub const UNKNOWN_MESSAGE: &str = "Unknown error occurred";

/// Coarse failure category a view can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request exceeded its deadline.
    Timeout,
    /// The catalog refused the request (4xx, bad query).
    ClientRejected,
    /// The catalog itself failed (5xx).
    ServerFailure,
    /// Anything else, including local storage failures.
    Unclassified,
}

/// A failure reduced to a kind plus a user-facing message.
///
/// Unlike [`FolioError`] this is `Clone`, so it can live inside published
/// view snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn timeout() -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: TIMEOUT_MESSAGE.to_string(),
        }
    }

    pub fn client_rejected(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ClientRejected,
            message: detail.into(),
        }
    }

    pub fn server_failure(detail: impl fmt::Display) -> Self {
        Self {
            kind: ErrorKind::ServerFailure,
            message: format!(
                "The catalog service is unavailable ({}). Please try again later.",
                detail
            ),
        }
    }

    pub fn unclassified(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let message = if detail.trim().is_empty() {
            UNKNOWN_MESSAGE.to_string()
        } else {
            detail
        };
        Self {
            kind: ErrorKind::Unclassified,
            message,
        }
    }

    fn from_status(status: u16, detail: String) -> Self {
        match status {
            400..=499 => Self::client_rejected(detail),
            500..=599 => Self::server_failure(detail),
            _ => Self::unclassified(detail),
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifiedError {}

impl From<&FolioError> for ClassifiedError {
    fn from(err: &FolioError) -> Self {
        match err {
            FolioError::Timeout => Self::timeout(),
            FolioError::Api { status, body } => {
                Self::from_status(*status, format!("{}: {}", status, body))
            }
            FolioError::Http(e) if e.is_timeout() => Self::timeout(),
            FolioError::Http(e) => match e.status() {
                Some(status) => Self::from_status(status.as_u16(), e.to_string()),
                None => Self::unclassified(e.to_string()),
            },
            other => Self::unclassified(other.to_string()),
        }
    }
}

impl From<FolioError> for ClassifiedError {
    fn from(err: FolioError) -> Self {
        Self::from(&err)
    }
}
