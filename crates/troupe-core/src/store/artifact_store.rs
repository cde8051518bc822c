//! ArtifactStore - versioned file registry trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::StoreError;

/// Artifact errors
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid artifact filename: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One tracked file, keyed by its original filename.
///
/// A record is overwritten in place when the same filename is registered
/// again; only the version counter and timestamp distinguish revisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Normalized original filename, the registry key
    pub filename: String,
    /// Latest content
    pub content: String,
    /// Revision counter, starts at 1
    pub version: u64,
    /// Last registration timestamp
    pub updated_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Create a first-version record
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// Replace the content and bump the version
    pub fn revise(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// Normalize a raw filename into a registry key.
///
/// Surrounding whitespace is trimmed. Names that are empty, reserved
/// ("." / ".."), or contain path separators or control characters are
/// rejected so a registry key can never escape its session.
pub fn normalize_filename(raw: &str) -> Result<String, ArtifactError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ArtifactError::InvalidName("empty filename".to_string()));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(ArtifactError::InvalidName(format!(
            "reserved name: {}",
            trimmed
        )));
    }
    if trimmed
        .chars()
        .any(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(ArtifactError::InvalidName(format!(
            "unsafe characters in: {}",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

/// ArtifactStore trait - async interface for multiple backend implementations.
///
/// Implementations normalize filenames via [`normalize_filename`] before
/// keying, so equal raw names always land on the same record.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Register file content under its original filename.
    ///
    /// A new name creates version 1; a known name is overwritten with the
    /// version counter incremented. Returns the stored record.
    async fn register(
        &self,
        filename: &str,
        content: &str,
    ) -> Result<ArtifactRecord, ArtifactError>;

    /// Get an artifact by filename
    async fn get(&self, filename: &str) -> Result<Option<ArtifactRecord>, StoreError>;

    /// List all artifacts in first-registration order
    async fn list(&self) -> Result<Vec<ArtifactRecord>, StoreError>;
}
