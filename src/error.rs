//! Error types for the kukaya-shell library.

use thiserror::Error;

/// Errors that can occur during shell-worker and API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required app-shell asset could not be retrieved during install.
    ///
    /// This is fatal to the install attempt: no partial cache generation
    /// is ever promoted.
    #[error("required asset {path} could not be fetched: {reason}")]
    AssetFetch {
        /// Asset-set path that failed.
        path: String,
        /// Why the fetch was rejected (transport failure or bad status).
        reason: String,
    },

    /// A live network exchange failed with no cached fallback available.
    #[error("network unavailable: {0}")]
    Network(String),

    /// The backend rejected a request.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status returned by the backend.
        status: u16,
        /// Error message from the response envelope.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be parsed or resolved against the configured origin.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error from cache storage or configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a backend response.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A specialized `Result` type for kukaya-shell operations.
pub type Result<T> = std::result::Result<T, Error>;
