//! Error types for the booking overlay

use thiserror::Error;

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or rendering booking data
///
/// None of these are ever surfaced to the host page: the session logs them
/// and keeps whatever it displayed before.
#[derive(Error, Debug)]
pub enum Error {
    /// The trigger URL could not be parsed or uses an unsupported scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network error while talking to the schedule API
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The response body was not the JSON we expected
    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}
