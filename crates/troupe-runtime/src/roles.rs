//! RoleRouter - maps a task's agent role to a task executor
//!
//! Tasks carry a free-form `agent_role` string. The router resolves it to a
//! registered executor, falling back to the default executor when the role is
//! empty or unknown.

use std::collections::HashMap;
use std::sync::Arc;

use troupe_core::collab::TaskExecutor;

/// RoleRouter - resolves agent roles to task executors
pub struct RoleRouter {
    executors: HashMap<String, Arc<dyn TaskExecutor>>,
    default_executor: Arc<dyn TaskExecutor>,
}

impl RoleRouter {
    /// Create a router with only a default executor
    pub fn new(default_executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            executors: HashMap::new(),
            default_executor,
        }
    }

    /// Register an executor for a role, replacing any previous registration
    pub fn register(mut self, role: impl Into<String>, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executors.insert(role.into(), executor);
        self
    }

    /// Resolve a role to an executor.
    ///
    /// An empty role means the task did not ask for a specialist and resolves
    /// to the default silently. An unknown role falls back too, with a warning,
    /// so a plan with a misspelled role still runs.
    pub fn resolve(&self, role: &str) -> Arc<dyn TaskExecutor> {
        if role.is_empty() {
            return Arc::clone(&self.default_executor);
        }
        match self.executors.get(role) {
            Some(executor) => Arc::clone(executor),
            None => {
                tracing::warn!(agent_role = %role, "Unknown agent role, using default executor");
                Arc::clone(&self.default_executor)
            }
        }
    }

    /// Registered role names, unordered
    pub fn roles(&self) -> Vec<String> {
        self.executors.keys().cloned().collect()
    }
}
