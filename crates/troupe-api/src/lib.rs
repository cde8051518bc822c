mod dto;
mod error;
mod runtime;
mod service;

pub use dto::{
    AnalysisView, ArtifactView, PlanView, RecentEventView, SessionView, TaskView, WorkflowSnapshot,
};
pub use error::{ApiError, ErrorCode};
pub use runtime::WorkflowApi;
pub use service::WorkflowService;
