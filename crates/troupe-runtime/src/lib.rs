//! # Troupe Runtime
//!
//! Session hosting, scheduling, and orchestration for Troupe workflows.
//!
//! This crate provides:
//! - SessionRuntime: one session's state, journal, bus, and artifacts
//! - SessionRegistry: the process-wide session map with idle eviction
//! - RoleRouter: agent-role to task-executor resolution
//! - Scheduler: dependency-ordered plan execution
//! - Orchestrator: the session-facing operation surface

mod orchestrator;
mod registry;
mod roles;
mod scheduler;
mod session;

pub use orchestrator::{Orchestrator, OrchestratorError};
pub use registry::{SessionRegistry, SessionRegistryConfig};
pub use roles::RoleRouter;
pub use scheduler::{FailurePolicy, Scheduler, SchedulerConfig, StepError};
pub use session::{SessionRuntime, SessionRuntimeConfig};

// Re-export core types for convenience
pub use troupe_core::prelude::*;
