use thiserror::Error;

/// Errors reported by the persistence layer.
///
/// A missing record is never an error, lookups return `Ok(None)` instead. Every
/// variant here means the store can no longer be trusted and must be treated as
/// fatal by the caller.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Internal(String),

    #[error("Corrupted {record} record: {reason}")]
    Corrupted { record: &'static str, reason: String },
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Internal(err.to_string())
    }
}
