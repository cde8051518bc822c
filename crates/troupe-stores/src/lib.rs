//! # Troupe Stores
//!
//! Minimal store implementations for the Troupe runtime.
//!
//! This crate provides:
//! - InMemory ProgressLog
//! - InMemory ArtifactStore
//! - In-process ProgressBus

mod artifact_store;
mod event_bus;
mod progress_log;

pub use artifact_store::InMemoryArtifactStore;
pub use event_bus::{BroadcastProgressBus, ProgressBus};
pub use progress_log::InMemoryProgressLog;

// Re-export core traits for convenience
pub use troupe_core::store::{
    normalize_filename, ArtifactError, ArtifactRecord, ArtifactStore, ProgressLog, StoreError,
};
