use async_trait::async_trait;
use tokio::sync::broadcast;

use troupe_core::ProgressEvent;

use crate::{AnalysisView, ApiError, ArtifactView, PlanView, SessionView, WorkflowSnapshot};

#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn create_session(&self, preferred_id: Option<String>) -> Result<SessionView, ApiError>;
    async fn submit_plan_request(
        &self,
        session_id: &str,
        request: &str,
    ) -> Result<PlanView, ApiError>;
    async fn submit_feedback(
        &self,
        session_id: &str,
        feedback: &str,
    ) -> Result<PlanView, ApiError>;
    async fn request_analysis(&self, session_id: &str) -> Result<AnalysisView, ApiError>;
    async fn accept_plan(&self, session_id: &str) -> Result<WorkflowSnapshot, ApiError>;
    async fn cancel_workflow(&self, session_id: &str) -> Result<(), ApiError>;
    async fn get_workflow_snapshot(
        &self,
        session_id: &str,
    ) -> Result<WorkflowSnapshot, ApiError>;
    async fn subscribe_progress(
        &self,
        session_id: &str,
    ) -> Result<broadcast::Receiver<ProgressEvent>, ApiError>;
    async fn list_artifacts(&self, session_id: &str) -> Result<Vec<ArtifactView>, ApiError>;
    async fn clear_session(&self, session_id: &str) -> Result<(), ApiError>;
}
