//! Error types for federation fetching and validation.

use thiserror::Error;

/// Errors raised while fetching a federation object.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote host could not be reached
    #[error("Remote host unreachable for {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Request did not finish within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Remote answered 404: the object is gone
    #[error("Object not found: {url}")]
    NotFound { url: String },

    /// Remote answered with another non-success status
    #[error("Remote returned status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Body was not valid JSON
    #[error("Failed to decode body of {url}: {source}")]
    Decode { url: String, source: DecodeError },

    /// Client could not be built from its configuration
    #[error("Invalid fetcher configuration: {0}")]
    InvalidConfig(String),
}

impl FetchError {
    /// Whether the remote reported the object as gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    /// Whether a later attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) | FetchError::Unreachable { .. } | FetchError::Timeout { .. } => {
                true
            }
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Response body could not be parsed as JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// A fetched object was rejected before being trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// JSON did not have the expected shape
    #[error("Malformed object: {0}")]
    Malformed(String),

    /// `type` was missing or not the expected one
    #[error("Expected object of type {expected}, found {found}")]
    WrongType { expected: &'static str, found: String },

    /// A field that must hold an http(s) URL did not
    #[error("Invalid URL in {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    /// `uuid` was not a UUID
    #[error("Invalid UUID: {0}")]
    InvalidUuid(String),

    /// Name empty or too long
    #[error("Invalid name length: {0}")]
    InvalidName(usize),

    /// A date field was not RFC 3339
    #[error("Invalid date in {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    /// A numeric field was outside its allowed range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    /// Declared identifier lives on another host than the one that served it
    #[error("Object {declared} was served by another host ({fetched_from})")]
    ForeignOrigin { declared: String, fetched_from: String },
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::Malformed(err.to_string())
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
