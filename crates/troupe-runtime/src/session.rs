//! SessionRuntime - one session's live workflow
//!
//! SessionRuntime owns:
//! - The session's WorkflowState behind a lock
//! - The progress journal and realtime bus (publish = journal, then bus)
//! - The per-session artifact registry
//! - The cancellation token for the current run

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use troupe_core::store::{ArtifactRecord, ArtifactStore, ProgressLog, StoreError};
use troupe_core::{ProgressEvent, WorkflowState};
use troupe_stores::{
    BroadcastProgressBus, InMemoryArtifactStore, InMemoryProgressLog, ProgressBus,
};

/// Configuration for SessionRuntime
#[derive(Debug, Clone)]
pub struct SessionRuntimeConfig {
    /// Journal capacity; the oldest events are dropped beyond this
    pub event_log_capacity: usize,
    /// Broadcast channel capacity for live observers
    pub bus_capacity: usize,
}

impl Default for SessionRuntimeConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: 10_000,
            bus_capacity: 1024,
        }
    }
}

/// SessionRuntime - manages one session's workflow state and progress delivery
pub struct SessionRuntime {
    session_id: String,
    /// Workflow state. The scheduler is the only writer while Executing.
    pub state: RwLock<WorkflowState>,
    /// Persisted progress journal
    pub progress_log: Arc<dyn ProgressLog>,
    /// Realtime progress bus
    pub progress_bus: Arc<dyn ProgressBus>,
    /// Artifact registry scoped to this session
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Cancellation token for the current run; replaced on each acceptance
    run_token: RwLock<CancellationToken>,
}

impl std::fmt::Debug for SessionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRuntime")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl SessionRuntime {
    /// Create a new session runtime with in-memory components
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_config(session_id, SessionRuntimeConfig::default())
    }

    /// Create a new session runtime with in-memory components and custom config
    pub fn with_config(session_id: impl Into<String>, config: SessionRuntimeConfig) -> Self {
        let session_id = session_id.into();
        Self::with_components(
            session_id,
            Arc::new(InMemoryProgressLog::with_max_events(
                config.event_log_capacity,
            )),
            Arc::new(BroadcastProgressBus::new(config.bus_capacity)),
            Arc::new(InMemoryArtifactStore::new()),
        )
    }

    /// Create a new session runtime with custom components
    pub fn with_components(
        session_id: impl Into<String>,
        progress_log: Arc<dyn ProgressLog>,
        progress_bus: Arc<dyn ProgressBus>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        let session_id = session_id.into();
        Self {
            state: RwLock::new(WorkflowState::new(&session_id)),
            session_id,
            progress_log,
            progress_bus,
            artifacts,
            run_token: RwLock::new(CancellationToken::new()),
        }
    }

    /// Get the session ID
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Publish a progress event: journal first, then live fan-out.
    ///
    /// The journal is the source of truth for ordering; observers attached to
    /// the bus see the same sequence because every publish goes through here.
    pub async fn publish(&self, event: ProgressEvent) -> Result<(), StoreError> {
        self.progress_log.append(event.clone()).await?;
        self.progress_bus.publish(event).await?;
        Ok(())
    }

    /// Subscribe to the realtime progress stream from now on.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProgressEvent> {
        self.progress_bus.subscribe()
    }

    /// The last `limit` journal entries, oldest first
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<ProgressEvent>, StoreError> {
        self.progress_log.recent(limit).await
    }

    /// The full journal in publish order
    pub async fn history(&self) -> Result<Vec<ProgressEvent>, StoreError> {
        self.progress_log.all().await
    }

    /// List registered artifacts in first-registration order
    pub async fn list_artifacts(&self) -> Result<Vec<ArtifactRecord>, StoreError> {
        self.artifacts.list().await
    }

    /// Check whether the scheduler currently owns this session
    pub async fn is_executing(&self) -> bool {
        self.state.read().await.phase.is_executing()
    }

    /// The cancellation token of the current run
    pub async fn run_token(&self) -> CancellationToken {
        self.run_token.read().await.clone()
    }

    /// Install a fresh token for a new run and return it
    pub async fn refresh_run_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.run_token.write().await = token.clone();
        token
    }

    /// Request cancellation of the current run
    pub async fn cancel_run(&self) {
        self.run_token.read().await.cancel();
    }
}
