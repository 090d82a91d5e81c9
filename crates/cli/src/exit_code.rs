//! Process exit codes
//!
//! Scripts rely on these values; keep them stable.

use photosync_core::Error;

/// Exit codes returned by photosync commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed without failures
    Success = 0,
    /// Unclassified failure, or some items failed to sync
    GeneralError = 1,
    /// Invalid arguments
    UsageError = 2,
    /// Storage or network failure
    NetworkError = 3,
    /// Credentials rejected
    AuthError = 4,
    /// Bucket, library or session not found
    NotFound = 5,
    /// Missing or invalid configuration
    ConfigError = 6,
}

impl ExitCode {
    /// Exit code for a core error
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Config(_) => ExitCode::ConfigError,
            Error::Network(_) => ExitCode::NetworkError,
            Error::Auth(_) => ExitCode::AuthError,
            Error::NotFound(_) => ExitCode::NotFound,
            Error::InvalidPath(_) => ExitCode::UsageError,
            Error::Io(_) | Error::Retrieval(_) | Error::General(_) => ExitCode::GeneralError,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}
