//! Storage layer: schema and error types for the record store

pub mod error;
pub mod schema;

pub use error::{StorageError, StorageResult};
