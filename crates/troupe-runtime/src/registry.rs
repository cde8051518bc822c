//! SessionRegistry - the process-wide map of live sessions
//!
//! One SessionRuntime per session id; lookups share the same Arc so every
//! caller observes the same state, journal, and artifact registry. Locking is
//! session-granular: the registry lock guards only the map itself, so
//! workflows of different sessions run fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::orchestrator::OrchestratorError;
use crate::session::{SessionRuntime, SessionRuntimeConfig};

/// Registry configuration
#[derive(Debug, Clone)]
pub struct SessionRegistryConfig {
    /// Maximum number of live sessions before idle eviction kicks in
    pub max_sessions: usize,
    /// Journal capacity per session
    pub event_log_capacity: usize,
    /// Broadcast capacity per session
    pub bus_capacity: usize,
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        let session = SessionRuntimeConfig::default();
        Self {
            max_sessions: 64,
            event_log_capacity: session.event_log_capacity,
            bus_capacity: session.bus_capacity,
        }
    }
}

/// SessionRegistry - owns every live SessionRuntime
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionRuntime>>>,
    config: SessionRegistryConfig,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create a registry with default configuration
    pub fn new() -> Self {
        Self::with_config(SessionRegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(config: SessionRegistryConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the runtime for a session, creating it on first use.
    ///
    /// At capacity the least recently touched non-executing session is
    /// evicted first; when every session is executing the request is
    /// rejected instead.
    pub async fn open_or_create(
        &self,
        session_id: &str,
    ) -> Result<Arc<SessionRuntime>, OrchestratorError> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(session_id) {
                return Ok(Arc::clone(session));
            }
        }

        let mut sessions = self.sessions.write().await;
        // Re-check: another caller may have created it between locks
        if let Some(session) = sessions.get(session_id) {
            return Ok(Arc::clone(session));
        }
        if sessions.len() >= self.config.max_sessions {
            self.evict_idle(&mut sessions).await?;
        }

        let session = Arc::new(SessionRuntime::with_config(
            session_id,
            SessionRuntimeConfig {
                event_log_capacity: self.config.event_log_capacity,
                bus_capacity: self.config.bus_capacity,
            },
        ));
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        tracing::info!(session_id = %session_id, "session created");
        Ok(session)
    }

    /// Get the runtime for an existing session
    pub async fn get(&self, session_id: &str) -> Result<Arc<SessionRuntime>, OrchestratorError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.to_string()))
    }

    /// Drop a session and everything it holds. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "session removed");
        }
        removed
    }

    /// Ids of all live sessions, unordered
    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Number of live sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict the least recently touched session that is not executing.
    ///
    /// Executing sessions are never evicted; their scheduler holds live state
    /// that observers may still be following.
    async fn evict_idle(
        &self,
        sessions: &mut HashMap<String, Arc<SessionRuntime>>,
    ) -> Result<(), OrchestratorError> {
        let mut candidate: Option<(String, DateTime<Utc>)> = None;
        for (id, session) in sessions.iter() {
            let state = session.state.read().await;
            if state.phase.is_executing() {
                continue;
            }
            let is_older = candidate
                .as_ref()
                .map(|(_, oldest)| state.updated_at < *oldest)
                .unwrap_or(true);
            if is_older {
                candidate = Some((id.clone(), state.updated_at));
            }
        }
        match candidate {
            Some((id, _)) => {
                tracing::info!(session_id = %id, "evicting idle session at capacity");
                sessions.remove(&id);
                Ok(())
            }
            None => Err(OrchestratorError::RegistryFull),
        }
    }
}
