//! File-based storage implementation

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::errors::StorageError;
use crate::domain::traits::{Loaded, UserMap, UserStore};

/// JSON file store holding the whole username map in one object
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write: write to temp, rename over target
    async fn atomic_write(&self, data: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn load(&self) -> Result<Loaded, StorageError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Loaded::Missing);
        }

        let data = fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(Loaded::Empty);
        }

        let users: UserMap = serde_json::from_str(&data)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", self.path.display(), e)))?;
        Ok(Loaded::Users(users))
    }

    async fn save(&self, users: &UserMap) -> Result<(), StorageError> {
        let mut json = serde_json::to_string_pretty(users)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        json.push('\n');
        self.atomic_write(&json).await
    }
}
