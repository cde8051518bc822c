//! Workflow state record
//!
//! WorkflowState is the per-session mutable record: current phase, installed
//! plan, per-task statuses, accumulated step outputs, and the final result.
//! It is mutated only by the scheduler and the phase-transition paths, always
//! under the session's single-writer lock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::WorkflowPhase;

use super::plan::Plan;
use super::task::{TaskId, TaskStatus};

/// Per-session workflow record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// External correlation key
    pub session_id: String,
    /// Current phase of the workflow
    pub phase: WorkflowPhase,
    /// Originating user request, exposed to execution context
    #[serde(default)]
    pub request: String,
    /// Installed plan, if any
    #[serde(default)]
    pub plan: Option<Plan>,
    /// Task id -> execution status, reset whenever a new plan is installed
    #[serde(default)]
    pub task_statuses: HashMap<TaskId, TaskStatus>,
    /// Task id -> produced output, context for dependent tasks
    #[serde(default)]
    pub step_outputs: HashMap<TaskId, String>,
    /// Aggregate result once the workflow reaches a terminal phase
    #[serde(default)]
    pub final_result: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Create a fresh record for a session
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            phase: WorkflowPhase::Initial,
            request: String::new(),
            plan: None,
            task_statuses: HashMap::new(),
            step_outputs: HashMap::new(),
            final_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Set the current phase
    pub fn set_phase(&mut self, phase: WorkflowPhase) {
        self.phase = phase;
        self.touch();
    }

    /// Record the originating user request
    pub fn set_request(&mut self, request: impl Into<String>) {
        self.request = request.into();
        self.touch();
    }

    /// Install a plan, resetting all per-task bookkeeping.
    ///
    /// Every task starts `Pending`; prior outputs and the final result are
    /// discarded. Used for both first creation and refinement.
    pub fn install_plan(&mut self, plan: Plan) {
        self.task_statuses = plan
            .task_ids()
            .map(|id| (id.clone(), TaskStatus::Pending))
            .collect();
        self.step_outputs = HashMap::new();
        self.final_result = None;
        self.plan = Some(plan);
        self.touch();
    }

    /// Status of a task, `Pending` when unknown
    pub fn status_of(&self, id: &TaskId) -> TaskStatus {
        self.task_statuses.get(id).copied().unwrap_or_default()
    }

    /// Set the status of a task
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) {
        self.task_statuses.insert(id.clone(), status);
        self.touch();
    }

    /// Record a task's output
    pub fn record_output(&mut self, id: &TaskId, output: impl Into<String>) {
        self.step_outputs.insert(id.clone(), output.into());
        self.touch();
    }

    /// Set the aggregate final result
    pub fn set_final_result(&mut self, result: impl Into<String>) {
        self.final_result = Some(result.into());
        self.touch();
    }

    /// Whether every task of the installed plan has a terminal status
    pub fn all_terminal(&self) -> bool {
        match &self.plan {
            Some(plan) => plan.task_ids().all(|id| self.status_of(id).is_terminal()),
            None => false,
        }
    }

    /// Whether every task of the installed plan completed successfully
    pub fn run_succeeded(&self) -> bool {
        match &self.plan {
            Some(plan) => plan.task_ids().all(|id| self.status_of(id).is_completed()),
            None => false,
        }
    }

    /// Ids of tasks currently in the given status, in plan order
    pub fn tasks_in_status(&self, status: TaskStatus) -> Vec<TaskId> {
        match &self.plan {
            Some(plan) => plan
                .task_ids()
                .filter(|id| self.status_of(id) == status)
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}
