//! ProgressLog - ordered progress event journal trait

use async_trait::async_trait;

use super::StoreError;
use crate::progress::ProgressEvent;

/// ProgressLog trait - async interface for a session's event journal.
///
/// Append order is the session's causal order; readers always see a prefix
/// of it. Live fan-out is the bus's job, the journal only records.
#[async_trait]
pub trait ProgressLog: Send + Sync {
    /// Append an event at the end of the journal
    async fn append(&self, event: ProgressEvent) -> Result<(), StoreError>;

    /// The last `limit` events, oldest first
    async fn recent(&self, limit: usize) -> Result<Vec<ProgressEvent>, StoreError>;

    /// The full journal in append order
    async fn all(&self) -> Result<Vec<ProgressEvent>, StoreError>;
}
