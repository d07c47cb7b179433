//! In-memory user registry.
//!
//! No media flow touches this.  It mirrors the media registry's shape so a
//! future authenticated gallery can build on it: atomic id assignment and
//! a uniqueness invariant on `username`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::UserRecord;

pub struct UserRegistry {
    next_id: AtomicU64,
    users: RwLock<BTreeMap<u64, UserRecord>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            users: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a user.  Usernames are unique.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<UserRecord> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = UserRecord {
            id,
            username: username.to_string(),
            password: password.to_string(),
        };
        users.insert(id, record.clone());

        info!(id, username, "Registered user");
        Ok(record)
    }

    pub async fn user_by_id(&self, id: u64) -> Option<UserRecord> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn user_by_name(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
