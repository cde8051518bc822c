//! # Troupe Core
//!
//! Core abstractions and deterministic logic for the Troupe workflow runtime.
//!
//! This crate contains:
//! - Task / Plan / WorkflowState definitions
//! - Plan graph validation and topological ordering
//! - The workflow phase machine as a pure transition function
//! - Progress event definitions
//! - Planner / TaskExecutor / ResultSynthesizer abstractions
//! - Store traits for the progress journal and artifact registry
//!
//! This crate does NOT care about:
//! - How plans and task results are produced (LLM, scripted, remote)
//! - How sessions are hosted or how many run concurrently
//! - How progress is delivered to observers

pub mod collab;
pub mod graph;
pub mod phase;
pub mod progress;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collab::{
        AnalysisReport, CollaboratorError, ExecutionContext, Planner, ProducedFile,
        ResultSynthesizer, StepOutcome, TaskExecutor,
    };
    pub use crate::graph::{downstream_closure, topological_order, validate, ValidationError};
    pub use crate::phase::{transition, InvalidTransition, PhaseEvent, WorkflowPhase};
    pub use crate::progress::{ProgressEvent, SessionId};
    pub use crate::store::{
        normalize_filename, ArtifactError, ArtifactRecord, ArtifactStore, ProgressLog, StoreError,
    };
    pub use crate::types::{Plan, Task, TaskId, TaskStatus, WorkflowState};
}

// Re-export key types at crate root
pub use collab::{
    AnalysisReport, CollaboratorError, ExecutionContext, Planner, ProducedFile, ResultSynthesizer,
    StepOutcome, TaskExecutor,
};
pub use graph::{topological_order, validate, ValidationError};
pub use phase::{transition, InvalidTransition, PhaseEvent, WorkflowPhase};
pub use progress::{ProgressEvent, SessionId};
pub use store::{ArtifactError, ArtifactRecord, ArtifactStore, ProgressLog, StoreError};
pub use types::{Plan, Task, TaskId, TaskStatus, WorkflowState};
