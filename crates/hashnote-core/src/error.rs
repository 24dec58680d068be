//! Engine error taxonomy
//!
//! `NotFound` and `InvalidInput` are the caller's fault, `Conflict` means
//! the mutation lost a race with a concurrent writer and may be retried by
//! the caller, and `Internal` wraps unrelated store failures. `MissingTag`
//! carries the tags matched before the miss so the caller can recover with
//! a partial result.

use thiserror::Error;

use crate::key::KeyError;
use crate::models::Tag;
use crate::storage::StorageError;

/// Errors returned by the notebook engine
#[derive(Error, Debug)]
pub enum Error {
    /// An id or name does not resolve within this notebook
    #[error("not found: {0}")]
    NotFound(String),

    /// A requested tag name does not exist; `matched` holds the tags
    /// resolved before the miss
    #[error("missing tag ({name})")]
    MissingTag { name: String, matched: Vec<Tag> },

    /// The transaction could not commit due to concurrent modification
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed body or id
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unrelated store failure
    #[error("storage error: {0}")]
    Internal(#[source] StorageError),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(msg) => Error::Conflict(msg),
            StorageError::NotFound { key } => Error::NotFound(key),
            other => Error::Internal(other),
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_conflict_maps_to_conflict() {
        let err: Error = StorageError::Conflict("busy".to_string()).into();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_storage_not_found_maps_to_not_found() {
        let err: Error = StorageError::NotFound {
            key: "note/x".to_string(),
        }
        .into();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_other_storage_errors_are_internal() {
        let err: Error = StorageError::Database(rusqlite::Error::InvalidQuery).into();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_missing_tag_display() {
        let err = Error::MissingTag {
            name: "zzz".to_string(),
            matched: Vec::new(),
        };
        assert!(err.to_string().contains("zzz"));
    }
}
