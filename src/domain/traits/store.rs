use async_trait::async_trait;
use std::collections::HashMap;

use crate::application::errors::StorageError;
use crate::domain::entities::UserRecord;

/// Username to record mapping as persisted
pub type UserMap = HashMap<String, UserRecord>;

/// What a store found when loading
#[derive(Debug)]
pub enum Loaded {
    /// No store exists yet
    Missing,
    /// The store exists but holds nothing
    Empty,
    Users(UserMap),
}

/// Store trait - abstraction for registry persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load(&self) -> Result<Loaded, StorageError>;

    /// Replace the whole persisted map
    async fn save(&self, users: &UserMap) -> Result<(), StorageError>;
}
