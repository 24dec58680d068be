//! Storage error handling
//!
//! Typed errors for the record store. Transaction races surface as
//! `Conflict`; everything else keeps its cause attached.

use std::io;

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// A record that was expected to exist is missing
    #[error("record not found: '{key}'")]
    NotFound { key: String },

    /// The transaction lost a race with a concurrent writer
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Failed to serialize a record for writing
    #[error("failed to encode record for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to deserialize a stored record
    #[error("failed to decode record at '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Classify a rusqlite error, separating commit races from plain failures.
pub(crate) fn classify_db_error(err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            StorageError::Conflict(err.to_string())
        }
        _ => StorageError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_is_classified_as_conflict() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        assert!(matches!(classify_db_error(err), StorageError::Conflict(_)));
    }

    #[test]
    fn test_other_errors_stay_database_errors() {
        let err = rusqlite::Error::InvalidQuery;
        assert!(matches!(classify_db_error(err), StorageError::Database(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound {
            key: "note/abc".to_string(),
        };
        assert!(err.to_string().contains("note/abc"));
    }
}
