//! Plan type definitions
//!
//! A Plan is an ordered collection of tasks whose dependency edges form a
//! DAG. The sequence order is presentational; execution order is derived from
//! the dependencies. Plans are immutable once handed to the scheduler: a
//! refinement produces a new Plan value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskId};

/// A multi-step plan produced by the planning collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Free-text summary of the overall approach
    pub summary: String,
    /// Tasks in presentational order
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// When this plan value was created
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Create a new plan
    pub fn new(summary: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            summary: summary.into(),
            tasks,
            created_at: Utc::now(),
        }
    }

    /// Number of tasks in the plan
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Look up a task by id
    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Positional index of a task in the presentational sequence
    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    /// Iterate over all task ids in presentational order
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.iter().map(|task| &task.id)
    }
}
