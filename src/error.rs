//! Error types for site storage

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while managing sites
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP client or another collaborator could not be set up
    #[error("Initialization failed: {0}")]
    InitializationError(String),

    /// The storage area rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The background worker behind the async facade is gone
    #[error("Worker closed: {0}")]
    WorkerClosed(String),

    /// Filesystem error from a file-backed storage area
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
