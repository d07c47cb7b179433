use thiserror::Error;

/// Errors produced by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Generic I/O error from the blob directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No record with the requested id.
    #[error("Media {0} not found")]
    NotFound(u64),

    /// A record exists but its blob is gone from disk.
    #[error("Media {0} has no stored file")]
    BlobMissing(u64),

    /// No blob stored under the given key.
    #[error("No blob under key '{0}'")]
    BlobNotFound(String),

    /// The key would escape the blob directory.
    #[error("Invalid blob key '{0}'")]
    InvalidKey(String),

    /// Username already taken.
    #[error("Username '{0}' is already registered")]
    DuplicateUsername(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
