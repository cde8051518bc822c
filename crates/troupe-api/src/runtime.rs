use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use troupe_core::{
    AnalysisReport, ArtifactRecord, Plan, ProgressEvent, Task, WorkflowPhase, WorkflowState,
};
use troupe_runtime::Orchestrator;

use crate::dto::{
    AnalysisView, ArtifactView, PlanView, RecentEventView, SessionView, TaskView, WorkflowSnapshot,
};
use crate::{ApiError, WorkflowService};

/// Journal tail length included in a snapshot
const SNAPSHOT_EVENT_LIMIT: usize = 10;

/// Embeddable facade over an [`Orchestrator`].
///
/// Validates raw caller input, folds orchestrator errors onto stable codes,
/// and renders domain state as serializable views. Everything stateful lives
/// in the orchestrator; the facade is freely cloneable.
#[derive(Clone)]
pub struct WorkflowApi {
    orchestrator: Arc<Orchestrator>,
}

impl WorkflowApi {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// The underlying orchestrator
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    async fn snapshot(&self, session_id: &str) -> Result<WorkflowSnapshot, ApiError> {
        let state = self.orchestrator.session_state(session_id).await?;
        let events = self
            .orchestrator
            .recent_events(session_id, SNAPSHOT_EVENT_LIMIT)
            .await?;
        let artifacts = self.orchestrator.list_artifacts(session_id).await?;
        Ok(snapshot_view(&state, events, &artifacts))
    }
}

#[async_trait]
impl WorkflowService for WorkflowApi {
    async fn create_session(&self, preferred_id: Option<String>) -> Result<SessionView, ApiError> {
        let session_id = preferred_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let session = self
            .orchestrator
            .registry()
            .open_or_create(&session_id)
            .await?;
        let state = session.state.read().await;
        Ok(session_to_view(&state))
    }

    async fn submit_plan_request(
        &self,
        session_id: &str,
        request: &str,
    ) -> Result<PlanView, ApiError> {
        require_session_id(session_id)?;
        if request.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "request must not be empty".to_string(),
            ));
        }

        let plan = self
            .orchestrator
            .submit_plan_request(session_id, request)
            .await?;
        let state = self.orchestrator.session_state(session_id).await?;
        Ok(plan_to_view(&plan, &state))
    }

    async fn submit_feedback(
        &self,
        session_id: &str,
        feedback: &str,
    ) -> Result<PlanView, ApiError> {
        require_session_id(session_id)?;
        if feedback.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "feedback must not be empty".to_string(),
            ));
        }

        let plan = self
            .orchestrator
            .submit_feedback(session_id, feedback)
            .await?;
        let state = self.orchestrator.session_state(session_id).await?;
        Ok(plan_to_view(&plan, &state))
    }

    async fn request_analysis(&self, session_id: &str) -> Result<AnalysisView, ApiError> {
        require_session_id(session_id)?;
        let report = self.orchestrator.request_analysis(session_id).await?;
        Ok(analysis_to_view(report))
    }

    async fn accept_plan(&self, session_id: &str) -> Result<WorkflowSnapshot, ApiError> {
        require_session_id(session_id)?;
        self.orchestrator.accept_plan(session_id).await?;
        self.snapshot(session_id).await
    }

    async fn cancel_workflow(&self, session_id: &str) -> Result<(), ApiError> {
        require_session_id(session_id)?;
        self.orchestrator.cancel_workflow(session_id).await?;
        Ok(())
    }

    async fn get_workflow_snapshot(
        &self,
        session_id: &str,
    ) -> Result<WorkflowSnapshot, ApiError> {
        require_session_id(session_id)?;
        self.snapshot(session_id).await
    }

    async fn subscribe_progress(
        &self,
        session_id: &str,
    ) -> Result<broadcast::Receiver<ProgressEvent>, ApiError> {
        require_session_id(session_id)?;
        Ok(self.orchestrator.subscribe(session_id).await?)
    }

    async fn list_artifacts(&self, session_id: &str) -> Result<Vec<ArtifactView>, ApiError> {
        require_session_id(session_id)?;
        let records = self.orchestrator.list_artifacts(session_id).await?;
        Ok(records.iter().map(artifact_to_view).collect())
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), ApiError> {
        require_session_id(session_id)?;
        self.orchestrator.clear_session(session_id).await?;
        Ok(())
    }
}

fn require_session_id(session_id: &str) -> Result<(), ApiError> {
    if session_id.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "session_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn session_to_view(state: &WorkflowState) -> SessionView {
    SessionView {
        id: state.session_id.clone(),
        phase: state.phase,
        created_at: state.created_at,
        updated_at: state.updated_at,
    }
}

fn task_to_view(task: &Task, state: &WorkflowState) -> TaskView {
    TaskView {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        agent_role: task.agent_role.clone(),
        dependencies: task.dependencies.iter().map(|id| id.to_string()).collect(),
        status: state.status_of(&task.id),
    }
}

fn plan_to_view(plan: &Plan, state: &WorkflowState) -> PlanView {
    PlanView {
        summary: plan.summary.clone(),
        tasks: plan
            .tasks
            .iter()
            .map(|task| task_to_view(task, state))
            .collect(),
        created_at: plan.created_at,
    }
}

fn analysis_to_view(report: AnalysisReport) -> AnalysisView {
    AnalysisView {
        scores: report.scores,
        suggestions: report.suggestions,
    }
}

fn artifact_to_view(record: &ArtifactRecord) -> ArtifactView {
    ArtifactView {
        filename: record.filename.clone(),
        content: record.content.clone(),
        version: record.version,
        updated_at: record.updated_at,
    }
}

fn event_to_view(event: &ProgressEvent) -> RecentEventView {
    let detail = match event {
        ProgressEvent::PlanCreated { plan, .. } => plan.summary.clone(),
        ProgressEvent::PlanAccepted { .. } => String::new(),
        ProgressEvent::StepStarted { index, total, .. } => {
            format!("step {} of {}", index, total)
        }
        ProgressEvent::StepCompleted { output, .. } => output.clone(),
        ProgressEvent::StepFailed { error, .. } => error.clone(),
        ProgressEvent::StepSkipped {
            failed_dependency, ..
        } => match failed_dependency {
            Some(dep) => format!("blocked by {}", dep),
            None => String::new(),
        },
        ProgressEvent::WorkflowCompleted { result, .. } => result.clone(),
        ProgressEvent::ArtifactUpdated {
            filename, version, ..
        } => format!("{} v{}", filename, version),
        ProgressEvent::Error { message, .. } => message.clone(),
    };
    RecentEventView {
        kind: event.kind().to_string(),
        task_id: event.task_id().map(|id| id.to_string()),
        detail,
        timestamp: event.timestamp(),
    }
}

fn snapshot_view(
    state: &WorkflowState,
    recent_events: Vec<ProgressEvent>,
    artifacts: &[ArtifactRecord],
) -> WorkflowSnapshot {
    // Success is only known once the run is over.
    let succeeded = match state.phase {
        WorkflowPhase::Completed => Some(state.run_succeeded()),
        WorkflowPhase::Error => Some(false),
        _ => None,
    };
    WorkflowSnapshot {
        session_id: state.session_id.clone(),
        phase: state.phase,
        succeeded,
        request: state.request.clone(),
        plan: state.plan.as_ref().map(|plan| plan_to_view(plan, state)),
        final_result: state.final_result.clone(),
        recent_events: recent_events.iter().map(event_to_view).collect(),
        artifacts: artifacts.iter().map(artifact_to_view).collect(),
        updated_at: state.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    use troupe_core::collab::{
        CollaboratorError, ExecutionContext, Planner, StepOutcome, TaskExecutor,
    };
    use troupe_core::{TaskId, TaskStatus};
    use troupe_runtime::{RoleRouter, Scheduler};

    use crate::ErrorCode;

    struct ScriptedPlanner {
        responses: Mutex<VecDeque<Result<Plan, CollaboratorError>>>,
    }

    impl ScriptedPlanner {
        fn new(responses: Vec<Result<Plan, CollaboratorError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }

        fn next_response(&self) -> Result<Plan, CollaboratorError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CollaboratorError::Failed("script exhausted".to_string())))
        }
    }

    #[async_trait]
    impl Planner for ScriptedPlanner {
        async fn create_plan(&self, _request: &str) -> Result<Plan, CollaboratorError> {
            self.next_response()
        }

        async fn refine_plan(
            &self,
            _current: &Plan,
            _feedback: &str,
        ) -> Result<Plan, CollaboratorError> {
            self.next_response()
        }

        async fn analyze_plan(&self, _plan: &Plan) -> Result<AnalysisReport, CollaboratorError> {
            Ok(AnalysisReport::new()
                .with_score("clarity", 7)
                .with_suggestions("split the final task"))
        }
    }

    struct EchoExecutor;

    #[async_trait]
    impl TaskExecutor for EchoExecutor {
        async fn execute(
            &self,
            task: &Task,
            _ctx: &ExecutionContext,
        ) -> Result<StepOutcome, CollaboratorError> {
            Ok(StepOutcome::new(format!("out-{}", task.id)))
        }
    }

    struct SlowEchoExecutor;

    #[async_trait]
    impl TaskExecutor for SlowEchoExecutor {
        async fn execute(
            &self,
            task: &Task,
            _ctx: &ExecutionContext,
        ) -> Result<StepOutcome, CollaboratorError> {
            sleep(Duration::from_millis(50)).await;
            Ok(StepOutcome::new(format!("out-{}", task.id)))
        }
    }

    /// Writes the same file on every task, so versions stack up
    struct NoteTakingExecutor;

    #[async_trait]
    impl TaskExecutor for NoteTakingExecutor {
        async fn execute(
            &self,
            task: &Task,
            _ctx: &ExecutionContext,
        ) -> Result<StepOutcome, CollaboratorError> {
            Ok(StepOutcome::new(format!("out-{}", task.id))
                .with_file("notes.md", format!("notes from {}", task.id)))
        }
    }

    fn two_task_plan() -> Plan {
        Plan::new(
            "research then write",
            vec![
                Task::new("research", "Research the topic"),
                Task::new("write", "Write the report")
                    .with_dependencies(vec![TaskId::from("research")]),
            ],
        )
    }

    fn chain_plan(len: usize) -> Plan {
        let mut tasks = Vec::new();
        for i in 1..=len {
            let mut task = Task::new(format!("t{}", i), format!("Step {}", i));
            if i > 1 {
                task = task.with_dependencies(vec![TaskId::from(format!("t{}", i - 1))]);
            }
            tasks.push(task);
        }
        Plan::new("long chain", tasks)
    }

    fn api_with(planner: Arc<dyn Planner>, executor: Arc<dyn TaskExecutor>) -> WorkflowApi {
        let scheduler = Arc::new(Scheduler::new(Arc::new(RoleRouter::new(executor))));
        WorkflowApi::new(Arc::new(Orchestrator::new(planner, scheduler)))
    }

    async fn wait_for_event(
        rx: &mut broadcast::Receiver<ProgressEvent>,
        kind: &str,
    ) -> ProgressEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event stream closed");
            if event.kind() == kind {
                return event;
            }
        }
    }

    #[test]
    fn test_create_session_uses_preferred_id() {
        tokio_test::block_on(async {
            let api = api_with(
                Arc::new(ScriptedPlanner::new(vec![])),
                Arc::new(EchoExecutor),
            );

            let view = api.create_session(Some("s1".to_string())).await.unwrap();
            assert_eq!(view.id, "s1");
            assert_eq!(view.phase, WorkflowPhase::Initial);

            // blank preferred ids fall back to a generated one
            let view = api.create_session(Some("   ".to_string())).await.unwrap();
            assert!(!view.id.trim().is_empty());
            assert_ne!(view.id, "   ");

            let view = api.create_session(None).await.unwrap();
            assert!(!view.id.is_empty());
        });
    }

    #[test]
    fn test_blank_session_id_is_invalid_argument() {
        tokio_test::block_on(async {
            let api = api_with(
                Arc::new(ScriptedPlanner::new(vec![])),
                Arc::new(EchoExecutor),
            );

            let err = api.get_workflow_snapshot("  ").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidArgument);
        });
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        tokio_test::block_on(async {
            let api = api_with(
                Arc::new(ScriptedPlanner::new(vec![])),
                Arc::new(EchoExecutor),
            );

            let err = api.get_workflow_snapshot("ghost").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::NotFound);
        });
    }

    #[test]
    fn test_blank_request_is_invalid_argument() {
        tokio_test::block_on(async {
            let api = api_with(
                Arc::new(ScriptedPlanner::new(vec![])),
                Arc::new(EchoExecutor),
            );

            let err = api.submit_plan_request("s1", "   ").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidArgument);
        });
    }

    #[test]
    fn test_submit_plan_request_returns_pending_plan_view() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));

            let view = api
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            assert_eq!(view.summary, "research then write");
            assert_eq!(view.tasks.len(), 2);
            assert!(view.tasks.iter().all(|t| t.status == TaskStatus::Pending));
            assert_eq!(view.tasks[1].id, "write");
            assert_eq!(view.tasks[1].dependencies, vec!["research".to_string()]);
        });
    }

    #[test]
    fn test_submit_feedback_returns_refined_view() {
        tokio_test::block_on(async {
            let refined = Plan::new(
                "research, interview, then write",
                vec![
                    Task::new("research", "Research the topic"),
                    Task::new("interview", "Interview an expert"),
                    Task::new("write", "Write the report").with_dependencies(vec![
                        TaskId::from("research"),
                        TaskId::from("interview"),
                    ]),
                ],
            );
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan()), Ok(refined)]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let view = api.submit_feedback("s1", "add an interview").await.unwrap();
            assert_eq!(view.tasks.len(), 3);
            assert_eq!(view.summary, "research, interview, then write");
        });
    }

    #[test]
    fn test_analysis_scores_flow_through() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let view = api.request_analysis("s1").await.unwrap();
            assert_eq!(view.scores.get("clarity"), Some(&7));
            assert_eq!(view.suggestions, "split the final task");
        });
    }

    #[test]
    fn test_accept_plan_snapshot_shows_executing() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(SlowEchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let snapshot = api.accept_plan("s1").await.unwrap();

            assert_eq!(snapshot.phase, WorkflowPhase::Executing);
            assert_eq!(snapshot.succeeded, None);
            assert!(snapshot.final_result.is_none());
            assert!(snapshot
                .recent_events
                .iter()
                .any(|e| e.kind == "plan_accepted"));
        });
    }

    #[test]
    fn test_accept_without_plan_is_conflict() {
        tokio_test::block_on(async {
            let api = api_with(
                Arc::new(ScriptedPlanner::new(vec![])),
                Arc::new(EchoExecutor),
            );
            api.create_session(Some("s1".to_string())).await.unwrap();

            let err = api.accept_plan("s1").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::Conflict);
        });
    }

    #[test]
    fn test_completed_run_snapshot() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let mut rx = api.subscribe_progress("s1").await.unwrap();
            api.accept_plan("s1").await.unwrap();
            wait_for_event(&mut rx, "workflow_completed").await;

            let snapshot = api.get_workflow_snapshot("s1").await.unwrap();
            assert_eq!(snapshot.phase, WorkflowPhase::Completed);
            assert_eq!(snapshot.succeeded, Some(true));
            assert!(snapshot.final_result.is_some());

            let plan = snapshot.plan.unwrap();
            assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Completed));
            let last = snapshot.recent_events.last().unwrap();
            assert_eq!(last.kind, "workflow_completed");
            assert_eq!(last.task_id, None);
        });
    }

    #[test]
    fn test_snapshot_keeps_last_ten_events() {
        tokio_test::block_on(async {
            // 5 tasks produce 13 events; the snapshot keeps the last 10
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(chain_plan(5))]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "long haul").await.unwrap();

            let mut rx = api.subscribe_progress("s1").await.unwrap();
            api.accept_plan("s1").await.unwrap();
            wait_for_event(&mut rx, "workflow_completed").await;

            let snapshot = api.get_workflow_snapshot("s1").await.unwrap();
            assert_eq!(snapshot.recent_events.len(), 10);
            assert_eq!(snapshot.recent_events[0].kind, "step_completed");
            assert_eq!(snapshot.recent_events[0].task_id, Some("t1".to_string()));
            assert_eq!(
                snapshot.recent_events.last().unwrap().kind,
                "workflow_completed"
            );
        });
    }

    #[test]
    fn test_cancelled_run_snapshot_reports_failure() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(SlowEchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let mut rx = api.subscribe_progress("s1").await.unwrap();
            api.accept_plan("s1").await.unwrap();
            api.cancel_workflow("s1").await.unwrap();
            wait_for_event(&mut rx, "error").await;

            let snapshot = api.get_workflow_snapshot("s1").await.unwrap();
            assert_eq!(snapshot.phase, WorkflowPhase::Error);
            assert_eq!(snapshot.succeeded, Some(false));
            assert!(snapshot.final_result.is_some());
            let plan = snapshot.plan.unwrap();
            assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Skipped));
        });
    }

    #[test]
    fn test_cancel_without_run_is_conflict() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let err = api.cancel_workflow("s1").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::Conflict);
        });
    }

    #[test]
    fn test_artifact_views_carry_versions() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(NoteTakingExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let mut rx = api.subscribe_progress("s1").await.unwrap();
            api.accept_plan("s1").await.unwrap();
            wait_for_event(&mut rx, "workflow_completed").await;

            let artifacts = api.list_artifacts("s1").await.unwrap();
            assert_eq!(artifacts.len(), 1);
            assert_eq!(artifacts[0].filename, "notes.md");
            assert_eq!(artifacts[0].version, 2);
            assert_eq!(artifacts[0].content, "notes from write");

            let snapshot = api.get_workflow_snapshot("s1").await.unwrap();
            assert_eq!(snapshot.artifacts.len(), 1);
        });
    }

    #[test]
    fn test_clear_session_then_not_found() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            api.clear_session("s1").await.unwrap();
            let err = api.get_workflow_snapshot("s1").await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::NotFound);
        });
    }

    #[test]
    fn test_snapshot_serializes_with_stable_labels() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let api = api_with(planner, Arc::new(EchoExecutor));
            api.submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let snapshot = api.get_workflow_snapshot("s1").await.unwrap();
            let json = serde_json::to_value(&snapshot).unwrap();
            assert_eq!(json["phase"], "plan_displayed");
            assert_eq!(json["succeeded"], serde_json::Value::Null);
            assert_eq!(json["plan"]["tasks"][0]["status"], "pending");
            assert_eq!(json["recent_events"][0]["kind"], "plan_created");
        });
    }
}
