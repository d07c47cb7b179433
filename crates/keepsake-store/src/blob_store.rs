use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Filesystem-backed key/value store for raw media bytes.
///
/// Keys are opaque strings chosen by the caller (the registry derives them
/// from the record id and a sanitized file name).  A key never names a
/// directory: anything containing a path separator or `..` is rejected, so
/// a blob path can never resolve outside the base directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    base_path: PathBuf,
}

impl BlobStore {
    /// Open the store, creating the directory if it does not exist yet.
    pub async fn open(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;

        info!(path = %base_path.display(), "Blob store initialized");

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.blob_path(key)?;

        fs::write(&path, data).await?;

        debug!(key = %key, size = data.len(), "Stored blob");
        Ok(())
    }

    /// Read a blob.  `BlobNotFound` when no file exists under the key.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key)?;

        if !path.exists() {
            return Err(StoreError::BlobNotFound(key.to_string()));
        }

        let data = fs::read(&path).await?;

        debug!(key = %key, size = data.len(), "Retrieved blob");
        Ok(data)
    }

    /// Delete a blob, returning whether a file was actually removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await?;

        debug!(key = %key, "Deleted blob");
        Ok(true)
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.blob_path(key).map(|p| p.exists()).unwrap_or(false)
    }

    /// Resolve a key to a path inside the base directory.
    ///
    /// Client file names feed into keys, so separators and `..` are
    /// rejected before the filesystem ever sees them.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        let resolved = self.base_path.join(key);
        if !resolved.starts_with(&self.base_path) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(resolved)
    }
}
