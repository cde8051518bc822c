use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use troupe_core::{TaskStatus, WorkflowPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub phase: WorkflowPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub agent_role: String,
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanView {
    pub summary: String,
    pub tasks: Vec<TaskView>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisView {
    pub scores: BTreeMap<String, u8>,
    pub suggestions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactView {
    pub filename: String,
    pub content: String,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// One journal entry flattened for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEventView {
    pub kind: String,
    pub task_id: Option<String>,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of one session's workflow.
///
/// `succeeded` is None until the workflow reaches a terminal phase;
/// `recent_events` holds the tail of the journal, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub session_id: String,
    pub phase: WorkflowPhase,
    pub succeeded: Option<bool>,
    pub request: String,
    pub plan: Option<PlanView>,
    pub final_result: Option<String>,
    pub recent_events: Vec<RecentEventView>,
    pub artifacts: Vec<ArtifactView>,
    pub updated_at: DateTime<Utc>,
}
