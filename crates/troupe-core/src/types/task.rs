//! Task type definitions
//!
//! Task is the atomic unit of work in a Plan: a titled piece of work assigned
//! to an execution role, gated on the completion of its dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strongly-typed Task ID.
///
/// Ids are authored by the planning collaborator and referenced by dependency
/// edges and status maps; they must be unique within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&TaskId> for TaskId {
    fn from(value: &TaskId) -> Self {
        value.clone()
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Per-task execution status.
///
/// `Pending → Running → {Completed | Failed | Skipped}`. `Skipped` is reached
/// only through failed-dependency propagation or run cancellation and never
/// consumes the execution collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for dependencies to complete
    #[default]
    Pending,
    /// Dispatched to the execution collaborator
    Running,
    /// Finished successfully, output recorded
    Completed,
    /// Execution collaborator returned an error or timed out
    Failed,
    /// A dependency failed; this task was never dispatched
    Skipped,
}

impl TaskStatus {
    /// Check if the status is terminal (no further automatic transition).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Check if the task finished successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// Check if the status counts as a failure for downstream dependency
    /// checks. Skipped tasks block their dependents the same way failed ones
    /// do.
    pub fn blocks_dependents(&self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Skipped)
    }

    /// Stable label of the status, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

/// A single unit of work in a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within the plan (logical ID)
    pub id: TaskId,
    /// Short human-readable label
    pub title: String,
    /// What the execution collaborator is asked to do
    #[serde(default)]
    pub description: String,
    /// Execution persona label, opaque to the core; resolved by the role
    /// router with a default fallback
    #[serde(default)]
    pub agent_role: String,
    /// IDs of tasks that must complete before this one may start
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    /// Create a new task with an id and title
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            agent_role: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the execution role label
    pub fn with_role(mut self, agent_role: impl Into<String>) -> Self {
        self.agent_role = agent_role.into();
        self
    }

    /// Set the dependencies
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Whether this task has no dependencies
    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}
