//! Timestamp columns are stored as unix milliseconds

use crate::StorageError;
use chrono::{DateTime, Utc};

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(
    column: &'static str,
    millis: i64,
) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StorageError::corrupt(column, millis))
}
