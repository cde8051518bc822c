//! ProgressBus - realtime progress fan-out abstraction.
//!
//! ProgressBus complements ProgressLog:
//! - ProgressLog persists one session's facts (journal).
//! - ProgressBus pushes the same facts to live observers.
//!
//! Observers attached to the same bus receive identical event sequences;
//! an observer subscribed mid-run simply starts at the current position.

use async_trait::async_trait;
use tokio::sync::broadcast;

use troupe_core::store::StoreError;
use troupe_core::ProgressEvent;

/// ProgressBus trait - async interface for realtime progress publish/subscribe.
#[async_trait]
pub trait ProgressBus: Send + Sync {
    /// Publish an event to all active observers.
    async fn publish(&self, event: ProgressEvent) -> Result<(), StoreError>;

    /// Subscribe to events published from now on.
    fn subscribe(&self) -> broadcast::Receiver<ProgressEvent>;
}

/// In-process ProgressBus based on tokio broadcast channels.
pub struct BroadcastProgressBus {
    tx: broadcast::Sender<ProgressEvent>,
    capacity: usize,
}

impl BroadcastProgressBus {
    /// Create a new broadcast bus with channel capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Return the configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastProgressBus {
    fn default() -> Self {
        // Default capacity for local realtime observers.
        Self::new(1024)
    }
}

#[async_trait]
impl ProgressBus for BroadcastProgressBus {
    async fn publish(&self, event: ProgressEvent) -> Result<(), StoreError> {
        // Ignore "no receiver" as a non-error; the journal remains source-of-truth.
        match self.tx.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }
}
