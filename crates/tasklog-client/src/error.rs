//! Client error types.

use std::path::PathBuf;

use tasklog_core::CoreError;
use tasklog_providers::{ProviderError, ProviderErrorCode};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the `tasklog` commands.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration, detected before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    /// The task store could not be queried.
    #[error("task store error: {0}")]
    Store(#[source] ProviderError),

    /// A calendar or OAuth call failed.
    #[error("provider error: {0}")]
    Provider(#[source] ProviderError),

    /// Interval parsing or ICS serialization failed.
    #[error("export failed: {0}")]
    Serialization(#[from] CoreError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cleanup finished but some events are still on the calendar.
    #[error("cleanup incomplete: {} deletion(s) failed: {}", failed.len(), failed.join(", "))]
    CleanupIncomplete { failed: Vec<String> },

    /// The run was cancelled or hit its deadline before finishing.
    #[error("interrupted: {0}")]
    Interrupted(String),
}

impl ClientError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// Configuration problems exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            code if code.is_interruption() => Self::Interrupted(err.to_string()),
            ProviderErrorCode::ConfigurationError => Self::Config(err.message().to_string()),
            _ => Self::Provider(err),
        }
    }
}
