//! Workflow phase machine
//!
//! The per-session workflow moves through an explicit enumerated phase driven
//! by a pure transition function. No rendering or transport concern leaks in
//! here; callers apply events and handle `InvalidTransition` rejections. An
//! illegal event never mutates anything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session-level workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// No plan requested yet
    #[default]
    Initial,
    /// Waiting on the planning collaborator for a first plan
    CreatingPlan,
    /// A plan is installed and awaiting user direction
    PlanDisplayed,
    /// User asked to revise; waiting for their feedback text
    AwaitingFeedback,
    /// Waiting on the planning collaborator for a revised plan
    RefiningPlan,
    /// An advisory analysis is displayed; the plan is unchanged
    Analyzing,
    /// The scheduler is running the accepted plan
    Executing,
    /// Every task reached a terminal status
    Completed,
    /// A fatal fault or cancellation; recoverable via a new plan request
    Error,
}

impl WorkflowPhase {
    /// Check if the phase is terminal (no further automatic transition).
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Completed | WorkflowPhase::Error)
    }

    /// Check if the scheduler owns the session right now.
    pub fn is_executing(&self) -> bool {
        matches!(self, WorkflowPhase::Executing)
    }

    /// Phases from which a plan may be accepted for execution.
    pub fn accepts_plan(&self) -> bool {
        matches!(self, WorkflowPhase::PlanDisplayed | WorkflowPhase::Analyzing)
    }
}

/// Events that drive the phase machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    /// User asked for a (new) plan
    CreatePlanRequested,
    /// The planning collaborator delivered a plan
    PlanReady,
    /// User asked to revise the displayed plan
    ReviseRequested,
    /// User submitted revision feedback
    FeedbackSubmitted,
    /// User asked for an advisory quality analysis
    AnalyzeRequested,
    /// The planning collaborator delivered an analysis
    AnalysisReady,
    /// User accepted the displayed plan for execution
    AcceptRequested,
    /// Every task of the running plan reached a terminal status
    AllTasksTerminal,
    /// A fatal fault or cancellation
    FatalError,
}

/// Rejection of an event that is not legal in the current phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {event:?} is not valid in phase {phase:?}")]
pub struct InvalidTransition {
    pub phase: WorkflowPhase,
    pub event: PhaseEvent,
}

/// Pure transition function over (phase, event).
///
/// Returns the next phase or `InvalidTransition`; the caller's state is
/// untouched either way. `FatalError` is accepted from every phase;
/// `CreatePlanRequested` restarts terminal sessions.
pub fn transition(
    phase: WorkflowPhase,
    event: PhaseEvent,
) -> Result<WorkflowPhase, InvalidTransition> {
    use PhaseEvent::*;
    use WorkflowPhase::*;

    let next = match (phase, event) {
        (_, FatalError) => Error,
        (Initial, CreatePlanRequested) => CreatingPlan,
        (Completed, CreatePlanRequested) => CreatingPlan,
        (Error, CreatePlanRequested) => CreatingPlan,
        (CreatingPlan, PlanReady) => PlanDisplayed,
        (PlanDisplayed, ReviseRequested) => AwaitingFeedback,
        (AwaitingFeedback, FeedbackSubmitted) => RefiningPlan,
        (RefiningPlan, PlanReady) => PlanDisplayed,
        (PlanDisplayed, AnalyzeRequested) => Analyzing,
        (Analyzing, AnalyzeRequested) => Analyzing,
        (Analyzing, AnalysisReady) => Analyzing,
        (PlanDisplayed, AcceptRequested) => Executing,
        (Analyzing, AcceptRequested) => Executing,
        (Executing, AllTasksTerminal) => Completed,
        _ => return Err(InvalidTransition { phase, event }),
    };
    Ok(next)
}
