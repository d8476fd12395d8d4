use marquee_core::{MarqueeError, PlaylistId};
use marquee_federation::{FetchError, ValidationError};
use thiserror::Error;

/// Errors that can occur while synchronizing a playlist
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure, timeout or non-404 error status; a later refresh may succeed
    #[error("Transient fetch failure: {0}")]
    TransientFetch(FetchError),

    /// Remote answered 404 for the playlist itself
    #[error("Remote playlist gone: {url}")]
    NotFound { url: String },

    /// Fetched body was malformed or failed the origin check
    #[error("Invalid object at {url}: {source}")]
    Validation {
        url: String,
        source: ValidationError,
    },

    /// Refreshed URL now serves a playlist with another identifier
    #[error("Playlist {expected} now identifies itself as {found}")]
    IdentityMismatch { expected: String, found: String },

    /// Referenced actor or video could not be resolved
    #[error("Resolution failed: {0}")]
    Resolution(String),

    /// Unknown local playlist
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    /// Local database failure
    #[error("Database error: {0}")]
    Database(#[from] MarqueeError),

    #[error("Invalid sync configuration: {0}")]
    Config(String),
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { url } => SyncError::NotFound { url },
            FetchError::Decode { url, source } => SyncError::Validation {
                url,
                source: ValidationError::Malformed(source.to_string()),
            },
            other => SyncError::TransientFetch(other),
        }
    }
}

/// Why a single collection item was dropped
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid element: {0}")]
    Validation(#[from] ValidationError),

    #[error("video resolution failed: {0}")]
    Resolution(#[source] MarqueeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
