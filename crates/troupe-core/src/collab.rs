//! Collaborator seams
//!
//! The core consumes three external collaborators through async traits:
//! - Planner: turns a request into a Plan, revises it, and reviews it
//! - TaskExecutor: performs one task's work given dependency context
//! - ResultSynthesizer: optional document-level aggregation of outputs
//!
//! The core does NOT care how collaborators are implemented (LLM backend,
//! scripted stub, remote service); failures surface as `CollaboratorError`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::types::{Plan, Task, TaskId};

/// Collaborator errors
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("collaborator call failed: {0}")]
    Failed(String),

    #[error("collaborator unreachable: {0}")]
    Unreachable(String),

    #[error("collaborator returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Advisory quality review of a plan.
///
/// `scores` maps a dimension name (e.g. completeness, clarity, actionability)
/// to a 1-10 rating; the dimension set is the planner's to choose and the
/// core treats it as opaque.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub scores: BTreeMap<String, u8>,
    #[serde(default)]
    pub suggestions: String,
}

impl AnalysisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dimension score
    pub fn with_score(mut self, dimension: impl Into<String>, score: u8) -> Self {
        self.scores.insert(dimension.into(), score);
        self
    }

    /// Set the free-text suggestions
    pub fn with_suggestions(mut self, suggestions: impl Into<String>) -> Self {
        self.suggestions = suggestions.into();
        self
    }
}

/// Planning collaborator - creates, revises, and reviews plans
#[async_trait]
pub trait Planner: Send + Sync {
    /// Generate a plan from a user request
    async fn create_plan(&self, request: &str) -> Result<Plan, CollaboratorError>;

    /// Produce a new plan from the current one plus user feedback
    async fn refine_plan(
        &self,
        current: &Plan,
        feedback: &str,
    ) -> Result<Plan, CollaboratorError>;

    /// Review a plan's quality without changing it
    async fn analyze_plan(&self, plan: &Plan) -> Result<AnalysisReport, CollaboratorError>;
}

/// Context handed to the execution collaborator for one task.
///
/// Carries the originating user request and the recorded outputs of the
/// task's completed dependencies. The cancellation token mirrors the
/// session's run token; executors may poll it, and the scheduler enforces it
/// between dispatches regardless.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub session_id: String,
    pub request: String,
    pub dependency_outputs: HashMap<TaskId, String>,
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Create a context with no dependency outputs
    pub fn new(session_id: impl Into<String>, request: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            request: request.into(),
            dependency_outputs: HashMap::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Attach dependency outputs
    pub fn with_dependency_outputs(mut self, outputs: HashMap<TaskId, String>) -> Self {
        self.dependency_outputs = outputs;
        self
    }

    /// Attach the session's run cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Recorded output of one dependency, if present
    pub fn output_of(&self, id: &TaskId) -> Option<&str> {
        self.dependency_outputs.get(id).map(String::as_str)
    }

    /// Check if the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// A file produced by a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducedFile {
    pub filename: String,
    pub content: String,
}

impl ProducedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Result of executing one task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Textual result, recorded as context for dependent tasks
    pub content: String,
    /// Files produced while executing, in production order
    #[serde(default)]
    pub produced_files: Vec<ProducedFile>,
}

impl StepOutcome {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            produced_files: Vec::new(),
        }
    }

    /// Add a produced file
    pub fn with_file(mut self, filename: impl Into<String>, content: impl Into<String>) -> Self {
        self.produced_files.push(ProducedFile::new(filename, content));
        self
    }
}

/// Execution collaborator - performs one task's work
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<StepOutcome, CollaboratorError>;
}

/// Optional aggregation collaborator for the final result.
///
/// When absent (or failing), the scheduler falls back to its deterministic
/// summary report.
#[async_trait]
pub trait ResultSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        request: &str,
        plan: &Plan,
        outputs: &HashMap<TaskId, String>,
    ) -> Result<String, CollaboratorError>;
}
