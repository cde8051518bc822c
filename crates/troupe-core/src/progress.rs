//! Progress event protocol
//!
//! Events represent facts produced by the orchestrator and scheduler for one
//! session. Within a session they are published in causal order; observers
//! receive them in exactly that order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Plan, TaskId};

/// Type alias for Session ID
pub type SessionId = String;

/// Progress event - append-only fact record for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A plan was created or refined and is displayed
    PlanCreated {
        /// Session this event belongs to
        session_id: SessionId,
        /// The newly installed plan
        plan: Plan,
        /// Event timestamp
        timestamp: DateTime<Utc>,
    },

    /// The displayed plan was accepted for execution
    PlanAccepted {
        session_id: SessionId,
        timestamp: DateTime<Utc>,
    },

    /// A task was dispatched to its execution collaborator
    StepStarted {
        session_id: SessionId,
        task_id: TaskId,
        /// 1-based position in the execution order
        index: usize,
        /// Total number of tasks in the plan
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// A task finished successfully
    StepCompleted {
        session_id: SessionId,
        task_id: TaskId,
        /// 1-based position in the execution order
        index: usize,
        /// The task's recorded output
        output: String,
        timestamp: DateTime<Utc>,
    },

    /// A task failed or timed out
    StepFailed {
        session_id: SessionId,
        task_id: TaskId,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// A task was skipped before it could run
    StepSkipped {
        session_id: SessionId,
        task_id: TaskId,
        /// The failed (or skipped) dependency that blocked this task.
        /// None when the task was skipped by cancellation or abort.
        #[serde(default)]
        failed_dependency: Option<TaskId>,
        timestamp: DateTime<Utc>,
    },

    /// Every task reached a terminal status
    WorkflowCompleted {
        session_id: SessionId,
        /// Aggregate final result, partial when some tasks failed
        result: String,
        timestamp: DateTime<Utc>,
    },

    /// An artifact was registered or overwritten
    ArtifactUpdated {
        session_id: SessionId,
        filename: String,
        content: String,
        version: u64,
        timestamp: DateTime<Utc>,
    },

    /// A fatal fault or cancellation
    Error {
        session_id: SessionId,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    /// Create a plan-created event
    pub fn plan_created(session_id: impl Into<String>, plan: Plan) -> Self {
        Self::PlanCreated {
            session_id: session_id.into(),
            plan,
            timestamp: Utc::now(),
        }
    }

    /// Create a plan-accepted event
    pub fn plan_accepted(session_id: impl Into<String>) -> Self {
        Self::PlanAccepted {
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a step-started event
    pub fn step_started(
        session_id: impl Into<String>,
        task_id: impl Into<TaskId>,
        index: usize,
        total: usize,
    ) -> Self {
        Self::StepStarted {
            session_id: session_id.into(),
            task_id: task_id.into(),
            index,
            total,
            timestamp: Utc::now(),
        }
    }

    /// Create a step-completed event
    pub fn step_completed(
        session_id: impl Into<String>,
        task_id: impl Into<TaskId>,
        index: usize,
        output: impl Into<String>,
    ) -> Self {
        Self::StepCompleted {
            session_id: session_id.into(),
            task_id: task_id.into(),
            index,
            output: output.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a step-failed event
    pub fn step_failed(
        session_id: impl Into<String>,
        task_id: impl Into<TaskId>,
        error: impl Into<String>,
    ) -> Self {
        Self::StepFailed {
            session_id: session_id.into(),
            task_id: task_id.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a step-skipped event
    pub fn step_skipped(
        session_id: impl Into<String>,
        task_id: impl Into<TaskId>,
        failed_dependency: Option<TaskId>,
    ) -> Self {
        Self::StepSkipped {
            session_id: session_id.into(),
            task_id: task_id.into(),
            failed_dependency,
            timestamp: Utc::now(),
        }
    }

    /// Create a workflow-completed event
    pub fn workflow_completed(session_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::WorkflowCompleted {
            session_id: session_id.into(),
            result: result.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an artifact-updated event
    pub fn artifact_updated(
        session_id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
        version: u64,
    ) -> Self {
        Self::ArtifactUpdated {
            session_id: session_id.into(),
            filename: filename.into(),
            content: content.into(),
            version,
            timestamp: Utc::now(),
        }
    }

    /// Create an error event
    pub fn error(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            session_id: session_id.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the session ID of this event
    pub fn session_id(&self) -> &str {
        match self {
            ProgressEvent::PlanCreated { session_id, .. } => session_id,
            ProgressEvent::PlanAccepted { session_id, .. } => session_id,
            ProgressEvent::StepStarted { session_id, .. } => session_id,
            ProgressEvent::StepCompleted { session_id, .. } => session_id,
            ProgressEvent::StepFailed { session_id, .. } => session_id,
            ProgressEvent::StepSkipped { session_id, .. } => session_id,
            ProgressEvent::WorkflowCompleted { session_id, .. } => session_id,
            ProgressEvent::ArtifactUpdated { session_id, .. } => session_id,
            ProgressEvent::Error { session_id, .. } => session_id,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProgressEvent::PlanCreated { timestamp, .. } => *timestamp,
            ProgressEvent::PlanAccepted { timestamp, .. } => *timestamp,
            ProgressEvent::StepStarted { timestamp, .. } => *timestamp,
            ProgressEvent::StepCompleted { timestamp, .. } => *timestamp,
            ProgressEvent::StepFailed { timestamp, .. } => *timestamp,
            ProgressEvent::StepSkipped { timestamp, .. } => *timestamp,
            ProgressEvent::WorkflowCompleted { timestamp, .. } => *timestamp,
            ProgressEvent::ArtifactUpdated { timestamp, .. } => *timestamp,
            ProgressEvent::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Get the task ID this event is about, if any
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            ProgressEvent::StepStarted { task_id, .. } => Some(task_id),
            ProgressEvent::StepCompleted { task_id, .. } => Some(task_id),
            ProgressEvent::StepFailed { task_id, .. } => Some(task_id),
            ProgressEvent::StepSkipped { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    /// Stable label of the event kind, matching the serde tag
    pub fn kind(&self) -> &'static str {
        match self {
            ProgressEvent::PlanCreated { .. } => "plan_created",
            ProgressEvent::PlanAccepted { .. } => "plan_accepted",
            ProgressEvent::StepStarted { .. } => "step_started",
            ProgressEvent::StepCompleted { .. } => "step_completed",
            ProgressEvent::StepFailed { .. } => "step_failed",
            ProgressEvent::StepSkipped { .. } => "step_skipped",
            ProgressEvent::WorkflowCompleted { .. } => "workflow_completed",
            ProgressEvent::ArtifactUpdated { .. } => "artifact_updated",
            ProgressEvent::Error { .. } => "error",
        }
    }
}
