//! Orchestrator - the session-facing surface of the workflow engine
//!
//! The Orchestrator is responsible for:
//! - Driving the phase machine through plan creation, revision, analysis,
//!   and acceptance
//! - Handing accepted plans to the Scheduler on a background task
//! - Exposing per-session state, progress events, and artifacts
//!
//! It does NOT perform any planning or task work itself; those go through
//! the collaborator seams.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;

use troupe_core::collab::{AnalysisReport, CollaboratorError, Planner};
use troupe_core::store::{ArtifactRecord, StoreError};
use troupe_core::{
    transition, InvalidTransition, PhaseEvent, Plan, ProgressEvent, ValidationError, WorkflowState,
};

use crate::registry::SessionRegistry;
use crate::scheduler::Scheduler;
use crate::session::SessionRuntime;

/// Errors surfaced by orchestrator operations
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("no plan available for session {0}")]
    NoPlanAvailable(String),

    #[error("a workflow is already executing for session {0}")]
    AlreadyExecuting(String),

    #[error("no workflow is currently executing for session {0}")]
    NotExecuting(String),

    #[error("session registry is full")]
    RegistryFull,

    #[error(transparent)]
    InvalidPlan(#[from] ValidationError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrator - owns the registry, the planner seam, and the scheduler
pub struct Orchestrator {
    registry: Arc<SessionRegistry>,
    planner: Arc<dyn Planner>,
    scheduler: Arc<Scheduler>,
}

impl Orchestrator {
    /// Create an orchestrator with a default in-memory registry
    pub fn new(planner: Arc<dyn Planner>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            planner,
            scheduler,
        }
    }

    /// Replace the session registry
    pub fn with_registry(mut self, registry: Arc<SessionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Create a plan for a session's request.
    ///
    /// Legal from Initial and from the terminal phases, which restart the
    /// session; the session itself is created on first use. On success the
    /// session ends in PlanDisplayed with the plan installed and a
    /// PlanCreated event in the journal.
    pub async fn submit_plan_request(
        &self,
        session_id: &str,
        request: &str,
    ) -> Result<Plan, OrchestratorError> {
        let session = self.registry.open_or_create(session_id).await?;
        {
            let mut state = session.state.write().await;
            let next = transition(state.phase, PhaseEvent::CreatePlanRequested)?;
            state.set_request(request);
            state.set_phase(next);
        }
        tracing::info!(session_id = %session_id, "plan requested");

        match self.planner.create_plan(request).await {
            Ok(plan) => self.install_plan(&session, plan).await,
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "plan creation failed");
                self.fail_setup(&session, &err.to_string()).await?;
                Err(err.into())
            }
        }
    }

    /// Revise the displayed plan with user feedback.
    ///
    /// The planner produces a replacement plan; task statuses and outputs
    /// reset with it. Legal only while a plan is displayed.
    pub async fn submit_feedback(
        &self,
        session_id: &str,
        feedback: &str,
    ) -> Result<Plan, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        let current = {
            let mut state = session.state.write().await;
            let Some(plan) = state.plan.clone() else {
                return Err(OrchestratorError::NoPlanAvailable(session_id.to_string()));
            };
            let awaiting = transition(state.phase, PhaseEvent::ReviseRequested)?;
            state.set_phase(awaiting);
            let refining = transition(state.phase, PhaseEvent::FeedbackSubmitted)?;
            state.set_phase(refining);
            plan
        };
        tracing::info!(session_id = %session_id, "plan revision requested");

        match self.planner.refine_plan(&current, feedback).await {
            Ok(plan) => self.install_plan(&session, plan).await,
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "plan revision failed");
                self.fail_setup(&session, &err.to_string()).await?;
                Err(err.into())
            }
        }
    }

    /// Ask the planner for an advisory quality review of the current plan.
    ///
    /// The plan itself is untouched. The session moves to Analyzing, where
    /// accepting and re-analyzing both stay legal; an analysis failure
    /// leaves it there too, since the review is advisory.
    pub async fn request_analysis(
        &self,
        session_id: &str,
    ) -> Result<AnalysisReport, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        let plan = {
            let mut state = session.state.write().await;
            let Some(plan) = state.plan.clone() else {
                return Err(OrchestratorError::NoPlanAvailable(session_id.to_string()));
            };
            let next = transition(state.phase, PhaseEvent::AnalyzeRequested)?;
            state.set_phase(next);
            plan
        };
        tracing::info!(session_id = %session_id, "plan analysis requested");

        match self.planner.analyze_plan(&plan).await {
            Ok(report) => {
                let mut state = session.state.write().await;
                if let Ok(next) = transition(state.phase, PhaseEvent::AnalysisReady) {
                    state.set_phase(next);
                }
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = %err, "plan analysis failed");
                Err(err.into())
            }
        }
    }

    /// Accept the displayed plan and start executing it in the background.
    ///
    /// Returns once the run is handed to the scheduler; progress arrives
    /// through the session's event stream. Re-accepting while a run is
    /// active is rejected.
    pub async fn accept_plan(&self, session_id: &str) -> Result<(), OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        {
            let mut state = session.state.write().await;
            if state.phase.is_executing() {
                return Err(OrchestratorError::AlreadyExecuting(session_id.to_string()));
            }
            if state.plan.is_none() {
                return Err(OrchestratorError::NoPlanAvailable(session_id.to_string()));
            }
            let next = transition(state.phase, PhaseEvent::AcceptRequested)?;
            state.set_phase(next);
            // New token before the Executing phase becomes visible, so a
            // cancel that sees this run targets this run.
            session.refresh_run_token().await;
        }
        session
            .publish(ProgressEvent::plan_accepted(session_id))
            .await?;
        tracing::info!(session_id = %session_id, "plan accepted, starting execution");

        let scheduler = Arc::clone(&self.scheduler);
        let run_session = Arc::clone(&session);
        tokio::spawn(async move {
            scheduler.run(run_session).await;
        });
        Ok(())
    }

    /// Request cancellation of the active run.
    ///
    /// In-flight tasks finish or time out; everything not yet dispatched is
    /// skipped and the session ends in the Error phase.
    pub async fn cancel_workflow(&self, session_id: &str) -> Result<(), OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        if !session.is_executing().await {
            return Err(OrchestratorError::NotExecuting(session_id.to_string()));
        }
        session.cancel_run().await;
        tracing::info!(session_id = %session_id, "workflow cancellation requested");
        Ok(())
    }

    /// A point-in-time copy of the session's workflow state
    pub async fn session_state(
        &self,
        session_id: &str,
    ) -> Result<WorkflowState, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        let state = session.state.read().await.clone();
        Ok(state)
    }

    /// The last `limit` progress events of a session, oldest first
    pub async fn recent_events(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ProgressEvent>, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        Ok(session.recent_events(limit).await?)
    }

    /// Artifacts of a session in first-registration order
    pub async fn list_artifacts(
        &self,
        session_id: &str,
    ) -> Result<Vec<ArtifactRecord>, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        Ok(session.list_artifacts().await?)
    }

    /// Subscribe to a session's live progress stream, from now on.
    ///
    /// Earlier events are in the journal; `recent_events` reconciles.
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<broadcast::Receiver<ProgressEvent>, OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        Ok(session.subscribe())
    }

    /// Drop a session entirely: state, journal, artifacts.
    ///
    /// An active run is cancelled first and winds down against a session no
    /// longer reachable through the registry.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), OrchestratorError> {
        let session = self.registry.get(session_id).await?;
        if session.is_executing().await {
            session.cancel_run().await;
        }
        self.registry.remove(session_id).await;
        Ok(())
    }

    /// Validate and install a planner-produced plan, entering PlanDisplayed
    async fn install_plan(
        &self,
        session: &Arc<SessionRuntime>,
        plan: Plan,
    ) -> Result<Plan, OrchestratorError> {
        if let Err(err) = troupe_core::validate(&plan) {
            tracing::warn!(
                session_id = %session.session_id(),
                error = %err,
                "planner returned an invalid plan"
            );
            self.fail_setup(session, &err.to_string()).await?;
            return Err(err.into());
        }
        {
            let mut state = session.state.write().await;
            let next = transition(state.phase, PhaseEvent::PlanReady)?;
            state.install_plan(plan.clone());
            state.set_phase(next);
        }
        tracing::info!(
            session_id = %session.session_id(),
            task_count = plan.task_count(),
            "plan installed"
        );
        session
            .publish(ProgressEvent::plan_created(session.session_id(), plan.clone()))
            .await?;
        Ok(plan)
    }

    /// Planning failed: move to Error, recoverable by a new plan request
    async fn fail_setup(
        &self,
        session: &Arc<SessionRuntime>,
        message: &str,
    ) -> Result<(), OrchestratorError> {
        {
            let mut state = session.state.write().await;
            if let Ok(next) = transition(state.phase, PhaseEvent::FatalError) {
                state.set_phase(next);
            }
        }
        session
            .publish(ProgressEvent::error(session.session_id(), message))
            .await?;
        Ok(())
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
    use troupe_core::collab::{ExecutionContext, StepOutcome, TaskExecutor};
    use troupe_core::{Task, TaskId, TaskStatus, WorkflowPhase};

    use crate::roles::RoleRouter;

    /// Replays a fixed sequence of planner responses
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
                .with_score("completeness", 8)
                .with_suggestions("tighten the middle tasks"))
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

    fn orchestrator_with(
        planner: Arc<dyn Planner>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Orchestrator {
        let scheduler = Arc::new(Scheduler::new(Arc::new(RoleRouter::new(executor))));
        Orchestrator::new(planner, scheduler)
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
    fn test_submit_plan_request_displays_plan() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));

            let plan = orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            assert_eq!(plan.task_count(), 2);
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::PlanDisplayed);
            assert_eq!(state.request, "write about lighthouses");
            assert_eq!(
                state.status_of(&TaskId::from("research")),
                TaskStatus::Pending
            );

            let events = orchestrator.recent_events("s1", 10).await.unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].kind(), "plan_created");
        });
    }

    #[test]
    fn test_new_plan_request_rejected_while_plan_displayed() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![
                Ok(two_task_plan()),
                Ok(two_task_plan()),
            ]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "first")
                .await
                .unwrap();

            let err = orchestrator
                .submit_plan_request("s1", "second")
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidTransition(_)));

            // the displayed plan is untouched
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::PlanDisplayed);
            assert_eq!(state.request, "first");
        });
    }

    #[test]
    fn test_planner_failure_is_recoverable() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![
                Err(CollaboratorError::Unreachable("backend down".to_string())),
                Ok(two_task_plan()),
            ]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));

            let err = orchestrator
                .submit_plan_request("s1", "try one")
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::Collaborator(_)));
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Error);

            // a new request restarts the session
            orchestrator
                .submit_plan_request("s1", "try two")
                .await
                .unwrap();
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::PlanDisplayed);
        });
    }

    #[test]
    fn test_invalid_planner_output_is_rejected() {
        tokio_test::block_on(async {
            let duplicate = Plan::new(
                "broken",
                vec![Task::new("a", "One"), Task::new("a", "One again")],
            );
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(duplicate)]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));

            let err = orchestrator
                .submit_plan_request("s1", "anything")
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidPlan(_)));
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Error);
        });
    }

    #[test]
    fn test_submit_feedback_installs_refined_plan() {
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
            let planner = Arc::new(ScriptedPlanner::new(vec![
                Ok(two_task_plan()),
                Ok(refined),
            ]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let plan = orchestrator
                .submit_feedback("s1", "add an interview")
                .await
                .unwrap();

            assert_eq!(plan.task_count(), 3);
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::PlanDisplayed);
            assert_eq!(
                state.plan.as_ref().unwrap().summary,
                "research, interview, then write"
            );
            // statuses reset for the new plan
            assert_eq!(
                state.status_of(&TaskId::from("interview")),
                TaskStatus::Pending
            );

            let kinds: Vec<&str> = orchestrator
                .recent_events("s1", 10)
                .await
                .unwrap()
                .iter()
                .map(|e| e.kind())
                .collect();
            assert_eq!(kinds, vec!["plan_created", "plan_created"]);
        });
    }

    #[test]
    fn test_feedback_without_plan_reports_no_plan() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator.registry().open_or_create("s1").await.unwrap();

            let err = orchestrator
                .submit_feedback("s1", "anything")
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::NoPlanAvailable(_)));
        });
    }

    #[test]
    fn test_operations_on_unknown_session_report_not_found() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));

            assert!(matches!(
                orchestrator.submit_feedback("ghost", "x").await.unwrap_err(),
                OrchestratorError::SessionNotFound(_)
            ));
            assert!(matches!(
                orchestrator.accept_plan("ghost").await.unwrap_err(),
                OrchestratorError::SessionNotFound(_)
            ));
            assert!(matches!(
                orchestrator.cancel_workflow("ghost").await.unwrap_err(),
                OrchestratorError::SessionNotFound(_)
            ));
        });
    }

    #[test]
    fn test_request_analysis_keeps_plan_acceptable() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let report = orchestrator.request_analysis("s1").await.unwrap();
            assert_eq!(report.scores.get("completeness"), Some(&8));

            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Analyzing);

            // analysis is repeatable and the plan can still be accepted
            orchestrator.request_analysis("s1").await.unwrap();
            orchestrator.accept_plan("s1").await.unwrap();
        });
    }

    #[test]
    fn test_accept_plan_runs_to_completion() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let mut rx = orchestrator.subscribe("s1").await.unwrap();
            orchestrator.accept_plan("s1").await.unwrap();
            wait_for_event(&mut rx, "workflow_completed").await;

            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Completed);
            assert!(state.run_succeeded());
            assert!(state.final_result.is_some());
            assert_eq!(state.step_outputs.get(&TaskId::from("write")).unwrap(), "out-write");
        });
    }

    #[test]
    fn test_accept_while_executing_is_rejected() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(SlowEchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            orchestrator.accept_plan("s1").await.unwrap();
            let err = orchestrator.accept_plan("s1").await.unwrap_err();
            assert!(matches!(err, OrchestratorError::AlreadyExecuting(_)));
        });
    }

    #[test]
    fn test_feedback_while_executing_is_rejected() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(SlowEchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            orchestrator.accept_plan("s1").await.unwrap();
            let err = orchestrator
                .submit_feedback("s1", "too late")
                .await
                .unwrap_err();
            assert!(matches!(err, OrchestratorError::InvalidTransition(_)));
            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Executing);
        });
    }

    #[test]
    fn test_cancel_without_active_run_is_rejected() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let err = orchestrator.cancel_workflow("s1").await.unwrap_err();
            assert!(matches!(err, OrchestratorError::NotExecuting(_)));
        });
    }

    #[test]
    fn test_cancel_skips_undispatched_tasks() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(SlowEchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            let mut rx = orchestrator.subscribe("s1").await.unwrap();
            orchestrator.accept_plan("s1").await.unwrap();
            orchestrator.cancel_workflow("s1").await.unwrap();
            wait_for_event(&mut rx, "error").await;

            let state = orchestrator.session_state("s1").await.unwrap();
            assert_eq!(state.phase, WorkflowPhase::Error);
            assert_eq!(
                state.status_of(&TaskId::from("research")),
                TaskStatus::Skipped
            );
            assert_eq!(state.status_of(&TaskId::from("write")), TaskStatus::Skipped);
        });
    }

    #[test]
    fn test_clear_session_drops_everything() {
        tokio_test::block_on(async {
            let planner = Arc::new(ScriptedPlanner::new(vec![Ok(two_task_plan())]));
            let orchestrator = orchestrator_with(planner, Arc::new(EchoExecutor));
            orchestrator
                .submit_plan_request("s1", "write about lighthouses")
                .await
                .unwrap();

            orchestrator.clear_session("s1").await.unwrap();

            assert!(matches!(
                orchestrator.session_state("s1").await.unwrap_err(),
                OrchestratorError::SessionNotFound(_)
            ));
            assert_eq!(orchestrator.registry().count().await, 0);
        });
    }
}
