//! Core type definitions for Troupe
//!
//! This module contains the fundamental types used throughout the system:
//! - Plan: collaborator-generated DAG of tasks
//! - Task: individual unit of work with dependencies and a role label
//! - WorkflowState: per-session mutable record driven by phase and scheduler

mod plan;
mod task;
mod workflow;

pub use plan::Plan;
pub use task::{Task, TaskId, TaskStatus};
pub use workflow::WorkflowState;
