//! In-memory media registry.
//!
//! The registry owns id assignment and the id-to-record map, and is the
//! only component that writes the blob store.  Records live for the
//! process lifetime; the blobs on disk are the only state that survives a
//! restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::blob_store::BlobStore;
use crate::error::{Result, StoreError};
use crate::models::MediaRecord;

/// Fields the upload pipeline supplies for a new record.  The registry
/// fills in `id` and `upload_date`.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub metadata: HashMap<String, String>,
}

pub struct MediaRegistry {
    blobs: BlobStore,
    next_id: AtomicU64,
    // BTreeMap so iteration follows id order, which is creation order.
    records: RwLock<BTreeMap<u64, MediaRecord>>,
}

impl MediaRegistry {
    pub fn new(blobs: BlobStore) -> Self {
        Self {
            blobs,
            next_id: AtomicU64::new(1),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Persist bytes, then register the record.
    ///
    /// Bytes are written first: a failed write consumes the id but leaves
    /// no half-registered record behind.  Ids are never reused, so the gap
    /// is harmless.
    pub async fn create_media(&self, new: NewMedia, bytes: &[u8]) -> Result<MediaRecord> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let key = storage_key(id, &new.file_name);

        self.blobs.write(&key, bytes).await?;

        let record = MediaRecord {
            id,
            file_name: new.file_name,
            file_type: new.file_type,
            file_size: new.file_size,
            upload_date: Utc::now(),
            metadata: new.metadata,
        };

        self.records.write().await.insert(id, record.clone());

        info!(id, name = %record.file_name, size = record.file_size, "Registered media");
        Ok(record)
    }

    /// All records, in creation order.
    pub async fn all_media(&self) -> Vec<MediaRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Metadata only, no byte read.
    pub async fn media_by_id(&self, id: u64) -> Option<MediaRecord> {
        self.records.read().await.get(&id).cloned()
    }

    /// Fetch both bytes and metadata.
    ///
    /// A record whose blob has gone missing is a store inconsistency and
    /// surfaces as `BlobMissing` rather than being papered over.
    pub async fn media_file(&self, id: u64) -> Result<(Vec<u8>, MediaRecord)> {
        let record = self
            .media_by_id(id)
            .await
            .ok_or(StoreError::NotFound(id))?;

        let key = storage_key(id, &record.file_name);
        match self.blobs.read(&key).await {
            Ok(bytes) => Ok((bytes, record)),
            Err(StoreError::BlobNotFound(_)) => {
                warn!(id, key = %key, "Record present but blob missing");
                Err(StoreError::BlobMissing(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Remove a record and its blob.
    ///
    /// The registry entry goes away even when blob deletion fails; returns
    /// false when no such record existed.
    pub async fn delete_media(&self, id: u64) -> bool {
        let Some(record) = self.records.write().await.remove(&id) else {
            return false;
        };

        let key = storage_key(id, &record.file_name);
        match self.blobs.delete(&key).await {
            Ok(true) => info!(id, "Deleted media"),
            Ok(false) => warn!(id, key = %key, "Blob already absent at delete"),
            Err(e) => warn!(id, error = %e, "Failed to delete blob"),
        }

        true
    }
}

/// On-disk key for a record: `{id}_{basename}`.
///
/// The raw client name may carry path components (some browsers submit a
/// full path); only the final component survives, control characters map
/// to `_`, and `..` sequences are neutralized.  The blob store rejects
/// anything that still looks like traversal.
fn storage_key(id: u64, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.replace("..", "__");

    if cleaned.is_empty() {
        format!("{id}_unnamed")
    } else {
        format!("{id}_{cleaned}")
    }
}
