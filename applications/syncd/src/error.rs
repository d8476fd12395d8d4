/// Daemon error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] marquee_core::MarqueeError),

    #[error("Sync error: {0}")]
    Sync(#[from] marquee_sync::SyncError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] marquee_federation::FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<marquee_storage::StorageError> for DaemonError {
    fn from(err: marquee_storage::StorageError) -> Self {
        // Convert StorageError -> MarqueeError -> DaemonError
        DaemonError::Database(err.into())
    }
}

impl From<config::ConfigError> for DaemonError {
    fn from(err: config::ConfigError) -> Self {
        DaemonError::Config(err.to_string())
    }
}
