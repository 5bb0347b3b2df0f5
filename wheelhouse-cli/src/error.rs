//! CLI-specific error types and exit code mapping

use wheelhouse_core::error::{IndexError, StorageError, WheelhouseError};
use wheelhouse_indexer::IndexerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from wheelhouse-core.
    #[error("{0}")]
    Core(#[from] WheelhouseError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                 |
    /// |------|-----------------------------------------|
    /// | 0    | Success                                 |
    /// | 1    | General / command / fatal indexing error |
    /// | 2    | Configuration error                     |
    /// | 5    | Publish incomplete (some pages failed)  |
    /// | 10   | IO error                                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(WheelhouseError::Config(_)) => 2,
            Self::Core(WheelhouseError::Index(IndexError::PublishIncomplete { .. })) => 5,
            Self::Io(_) | Self::Core(WheelhouseError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<IndexerError> for CliError {
    fn from(e: IndexerError) -> Self {
        Self::Core(e.into())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::Core(e.into())
    }
}
