//! ArtifactStore implementations

use async_trait::async_trait;
use std::sync::RwLock;

use troupe_core::store::{
    normalize_filename, ArtifactError, ArtifactRecord, ArtifactStore, StoreError,
};

/// In-memory implementation for development and testing.
///
/// Records live in a Vec in first-registration order; a repeated filename
/// revises its record in place, so listing order never changes after the
/// first registration.
pub struct InMemoryArtifactStore {
    artifacts: RwLock<Vec<ArtifactRecord>>,
}

impl InMemoryArtifactStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            artifacts: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn register(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<ArtifactRecord, ArtifactError> {
        let key = normalize_filename(filename)?;
        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        if let Some(existing) = artifacts.iter_mut().find(|a| a.filename == key) {
            existing.revise(content);
            return Ok(existing.clone());
        }

        let record = ArtifactRecord::new(key, content);
        artifacts.push(record.clone());
        Ok(record)
    }

    async fn get(&self, filename: &str) -> Result<Option<ArtifactRecord>, StoreError> {
        let key = match normalize_filename(filename) {
            Ok(key) => key,
            Err(_) => return Ok(None),
        };
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(artifacts.iter().find(|a| a.filename == key).cloned())
    }

    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(artifacts.clone())
    }
}
