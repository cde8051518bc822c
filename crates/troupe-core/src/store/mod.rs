//! Store module
//!
//! This module provides storage abstractions for one session's run history:
//! - ProgressLog: ordered progress event journal (async trait)
//! - ArtifactStore: versioned file registry keyed by filename (async trait)
//!
//! Note: Implementations are in troupe-stores crate

mod artifact_store;
mod progress_log;

pub use artifact_store::{normalize_filename, ArtifactError, ArtifactRecord, ArtifactStore};
pub use progress_log::ProgressLog;

use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
