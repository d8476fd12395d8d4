/// Storage-specific errors
use thiserror::Error;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored value could not be mapped back to a domain type
    #[error("Corrupt {column} value: {value}")]
    CorruptValue { column: &'static str, value: String },

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a corrupt value error
    pub fn corrupt(column: &'static str, value: impl ToString) -> Self {
        Self::CorruptValue {
            column,
            value: value.to_string(),
        }
    }
}

impl From<StorageError> for marquee_core::MarqueeError {
    fn from(err: StorageError) -> Self {
        marquee_core::MarqueeError::storage(err.to_string())
    }
}
