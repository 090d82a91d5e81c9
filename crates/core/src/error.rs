//! Error types for photosync-core
//!
//! A single error enum covers every failure the core can surface. Per-item
//! failures during a sync never escape as an `Error`; they are folded into
//! the run's outcome as messages.

use thiserror::Error;

/// Result alias used throughout the core crate
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or storage service failure
    #[error("Network error: {0}")]
    Network(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown session, bucket or object
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials or verification code rejected
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// A path or file name that cannot be used
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No retrieval strategy produced bytes for an item
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Anything else
    #[error("{0}")]
    General(String),
}
