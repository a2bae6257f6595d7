//! User registry - username to chat mapping with write-through persistence

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::entities::UserRecord;
use crate::domain::traits::{Loaded, UserMap, UserStore};

/// In-memory user map mirrored to a [`UserStore`].
///
/// Every operation runs under one exclusive lock. Persistence happens while
/// the lock is held, so the store always reflects a complete map.
pub struct UserRegistry {
    users: Mutex<UserMap>,
    store: Arc<dyn UserStore>,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            users: Mutex::new(UserMap::new()),
            store,
        }
    }

    /// Populate the map from the store. Never fails; returns the user count.
    pub async fn load(&self) -> usize {
        let mut users = self.users.lock().await;

        match self.store.load().await {
            Ok(Loaded::Users(loaded)) => {
                *users = loaded;
                tracing::info!("Loaded {} users", users.len());
            }
            Ok(Loaded::Missing) => {
                tracing::info!("Users file not found, creating a new one");
                users.clear();
                self.save_logged(&users).await;
            }
            Ok(Loaded::Empty) => {
                tracing::info!("Users file is empty, initializing an empty registry");
                users.clear();
                self.save_logged(&users).await;
            }
            Err(e) => {
                // Leave the unreadable file in place; memory is authoritative
                tracing::warn!("Failed to load users, starting empty: {}", e);
                users.clear();
            }
        }

        users.len()
    }

    /// Insert a record for an unseen username and persist.
    ///
    /// Returns `false` without touching the store if the username is known.
    pub async fn upsert_if_absent(
        &self,
        username: &str,
        chat_id: i64,
        contact: Option<String>,
    ) -> bool {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return false;
        }

        let record = UserRecord::new(chat_id).with_contact(contact);
        tracing::info!("New user added: {} ({})", username, record);
        users.insert(username.to_string(), record);
        self.save_logged(&users).await;
        true
    }

    pub async fn lookup(&self, username: &str) -> Option<UserRecord> {
        self.users.lock().await.get(username).cloned()
    }

    /// Point-in-time copy of every registered user
    pub async fn snapshot(&self) -> Vec<(String, UserRecord)> {
        self.users
            .lock()
            .await
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect()
    }

    /// Write the full map to the store
    pub async fn persist(&self) -> Result<(), StorageError> {
        let users = self.users.lock().await;
        self.store.save(&users).await
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    async fn save_logged(&self, users: &UserMap) {
        if let Err(e) = self.store.save(users).await {
            tracing::error!("Failed to save users: {}", e);
        }
    }
}
