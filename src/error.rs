use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, PartialEq)]
pub enum FarmhubError {
    /// Raised locally whenever an operation needs a session token and none is held
    #[error("User is not authorized")]
    Unauthorized,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid token provided")]
    InvalidToken(String),

    /// Failure reported by the remote API. The message is shown to the
    /// user verbatim so it's the only thing `Display` renders
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    /// A response arrived for a session that has since ended or been replaced
    #[error("Your session changed before the request completed")]
    SessionChanged,

    #[error("Unable to reach the server: {0}")]
    NetworkError(String),

    #[error("The server took longer than {0:?} to respond")]
    Timeout(Duration),

    #[error("Storage is unavailable: {0}")]
    StorageError(String),

    #[error("Product data was malformed: {0}")]
    MalformedProduct(String),

    #[error("Provided data was malformed")]
    MalformedData,

    #[error("Unexpected error occurred")]
    PoisonConcurrencyError(String),

    #[error("Unexpected error occurred")]
    UnexpectedError,
}

impl FarmhubError {
    /// Whether this error came back from the remote side, as opposed to
    /// being raised before a request was made
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::NetworkError(_) | Self::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for FarmhubError {
    fn from(e: serde_json::Error) -> FarmhubError {
        use serde_json::error::Category::*;
        error!(err = ?e, "JSON Serde error occurred");

        match e.classify() {
            Syntax | Data | Eof => FarmhubError::MalformedData,
            _ => FarmhubError::UnexpectedError,
        }
    }
}

impl From<std::io::Error> for FarmhubError {
    fn from(e: std::io::Error) -> FarmhubError {
        error!(err = ?e, kind = ?e.kind(), "storage IO error occurred");
        FarmhubError::StorageError(e.to_string())
    }
}

impl From<reqwest::Error> for FarmhubError {
    fn from(e: reqwest::Error) -> FarmhubError {
        error!(
            err = ?e,
            is_timeout = e.is_timeout(),
            is_connect = e.is_connect(),
            "HTTP client error occurred"
        );
        if e.is_decode() {
            return FarmhubError::MalformedData;
        }
        FarmhubError::NetworkError(e.to_string())
    }
}

impl From<url::ParseError> for FarmhubError {
    fn from(e: url::ParseError) -> FarmhubError {
        error!(err = ?e, "failed to build request URL");
        FarmhubError::BadRequest(e.to_string())
    }
}

impl<T> From<PoisonError<T>> for FarmhubError {
    fn from(e: PoisonError<T>) -> FarmhubError {
        error!(err = %e, "lock was poisoned");
        FarmhubError::PoisonConcurrencyError(e.to_string())
    }
}
