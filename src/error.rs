//! Error types for key storage and registry operations.

use thiserror::Error;

/// Result type for backing-file operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reading or writing the backing file.
///
/// Content that is not JSON is not an error: [`crate::store::KeyFile::load`]
/// resets the file instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Valid JSON that does not hold an array of key records.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The temporary file could not be renamed over the target.
    #[error("failed to replace keys file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Outcomes of a registry operation that did not succeed.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A record with this key string already exists.
    #[error("key already exists: {0}")]
    Conflict(String),

    /// No record with this key string.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
