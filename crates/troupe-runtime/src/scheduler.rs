//! Scheduler - dependency-ordered execution of an accepted plan
//!
//! The Scheduler is responsible for:
//! - Dispatching ready tasks in topological order, a bounded batch at a time
//! - Feeding each task the outputs of its completed dependencies
//! - Propagating a failure to everything downstream of it as `Skipped`
//! - Producing the final result (synthesis or summary report) when every
//!   task has reached a terminal status
//!
//! The Scheduler is the only writer of a session's WorkflowState while the
//! phase is Executing. State locks are held only for individual mutations,
//! never across a task execution await.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

use troupe_core::collab::{CollaboratorError, ExecutionContext, ResultSynthesizer, StepOutcome};
use troupe_core::graph::downstream_closure;
use troupe_core::store::{ArtifactError, StoreError};
use troupe_core::{transition, PhaseEvent, Plan, ProgressEvent, Task, TaskId, TaskStatus};

use crate::roles::RoleRouter;
use crate::session::SessionRuntime;

const MAX_LOG_TEXT_CHARS: usize = 2_000;
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

/// What to do with not-yet-dispatched tasks after a task fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep running branches that do not depend on the failed task
    #[default]
    ContinueUnaffected,
    /// Skip every remaining pending task after the first failure
    AbortRun,
}

/// Terminal failure of one dispatched task
#[derive(Debug, Clone, Error)]
pub enum StepError {
    #[error("task execution timed out after {timeout:?}")]
    ExecutionTimeout { timeout: Duration },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of tasks dispatched concurrently
    pub max_parallel: usize,
    /// Wall-clock budget per task; an overrun fails the task
    pub step_timeout: Duration,
    /// Failure handling for not-yet-dispatched tasks
    pub failure_policy: FailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Immutable per-run data derived from the installed plan
struct RunPlan {
    plan: Plan,
    order: Vec<TaskId>,
    positions: HashMap<TaskId, usize>,
    total: usize,
    request: String,
}

impl RunPlan {
    fn position_of(&self, id: &TaskId) -> usize {
        self.positions.get(id).copied().unwrap_or(0)
    }
}

/// Scheduler - runs an accepted plan to completion
pub struct Scheduler {
    router: Arc<RoleRouter>,
    synthesizer: Option<Arc<dyn ResultSynthesizer>>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler with default configuration
    pub fn new(router: Arc<RoleRouter>) -> Self {
        Self {
            router,
            synthesizer: None,
            config: SchedulerConfig::default(),
        }
    }

    /// Attach a result synthesizer, consulted when a run succeeds
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn ResultSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the maximum number of concurrently dispatched tasks
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.config.max_parallel = max.max(1);
        self
    }

    /// Set the per-task wall-clock budget
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.config.step_timeout = timeout;
        self
    }

    /// Set the failure handling policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Run the session's installed plan until every task is terminal.
    ///
    /// Store errors abort the run and move the session to the Error phase;
    /// task failures do not, they are part of the normal outcome.
    pub async fn run(&self, session: Arc<SessionRuntime>) {
        if let Err(err) = self.run_inner(&session).await {
            self.fail_session(&session, &err).await;
        }
    }

    async fn run_inner(&self, session: &Arc<SessionRuntime>) -> Result<(), StoreError> {
        let (plan, request) = {
            let state = session.state.read().await;
            match &state.plan {
                Some(plan) => (plan.clone(), state.request.clone()),
                None => {
                    tracing::error!(
                        session_id = %session.session_id(),
                        "scheduler started without an installed plan"
                    );
                    self.enter_error_phase(session).await;
                    session
                        .publish(ProgressEvent::error(
                            session.session_id(),
                            "no plan installed",
                        ))
                        .await?;
                    return Ok(());
                }
            }
        };

        // Plans are validated at install time, so ordering cannot fail here.
        let order = match troupe_core::topological_order(&plan) {
            Ok(order) => order,
            Err(err) => {
                tracing::error!(
                    session_id = %session.session_id(),
                    error = %err,
                    "installed plan failed ordering"
                );
                self.enter_error_phase(session).await;
                session
                    .publish(ProgressEvent::error(session.session_id(), err.to_string()))
                    .await?;
                return Ok(());
            }
        };
        let run = RunPlan {
            positions: order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.clone(), i + 1))
                .collect(),
            total: plan.task_count(),
            order,
            request,
            plan,
        };
        let token = session.run_token().await;

        tracing::info!(
            session_id = %session.session_id(),
            task_count = run.total,
            max_parallel = self.config.max_parallel,
            "workflow execution started"
        );

        loop {
            if token.is_cancelled() {
                return self.cancel_remaining(session, &run).await;
            }

            let ready = self.ready_tasks(session, &run).await;
            if ready.is_empty() {
                if !session.state.read().await.all_terminal() {
                    self.fail_unschedulable(session, &run).await?;
                }
                return self.finalize(session, &run).await;
            }

            let batch: Vec<TaskId> = ready
                .into_iter()
                .take(self.config.max_parallel)
                .collect();
            let any_failed = self.execute_batch(session, &run, batch).await?;

            if any_failed && self.config.failure_policy == FailurePolicy::AbortRun {
                self.abort_remaining(session, &run).await?;
                return self.finalize(session, &run).await;
            }
        }
    }

    /// Pending tasks whose dependencies have all completed, in dispatch order
    async fn ready_tasks(&self, session: &Arc<SessionRuntime>, run: &RunPlan) -> Vec<TaskId> {
        let state = session.state.read().await;
        run.order
            .iter()
            .filter(|id| {
                state.status_of(id) == TaskStatus::Pending
                    && run
                        .plan
                        .get_task(id)
                        .map(|task| {
                            task.dependencies
                                .iter()
                                .all(|dep| state.status_of(dep).is_completed())
                        })
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Dispatch a batch and drain it fully. Returns whether any task failed.
    async fn execute_batch(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
        batch: Vec<TaskId>,
    ) -> Result<bool, StoreError> {
        let token = session.run_token().await;
        let mut in_flight = FuturesUnordered::new();

        for task_id in batch {
            let Some(task) = run.plan.get_task(&task_id).cloned() else {
                continue;
            };
            let index = run.position_of(&task_id);

            let dependency_outputs: HashMap<TaskId, String> = {
                let state = session.state.read().await;
                task.dependencies
                    .iter()
                    .filter_map(|dep| {
                        state
                            .step_outputs
                            .get(dep)
                            .map(|output| (dep.clone(), output.clone()))
                    })
                    .collect()
            };

            session
                .state
                .write()
                .await
                .set_status(&task.id, TaskStatus::Running);
            tracing::info!(
                session_id = %session.session_id(),
                task_id = %task.id,
                agent_role = %task.agent_role,
                index = index,
                total = run.total,
                "task execution started"
            );
            session
                .publish(ProgressEvent::step_started(
                    session.session_id(),
                    task.id.clone(),
                    index,
                    run.total,
                ))
                .await?;

            let executor = self.router.resolve(&task.agent_role);
            let ctx = ExecutionContext::new(session.session_id(), run.request.as_str())
                .with_dependency_outputs(dependency_outputs)
                .with_cancellation(token.child_token());
            let step_timeout = self.config.step_timeout;

            in_flight.push(async move {
                let result =
                    match tokio::time::timeout(step_timeout, executor.execute(&task, &ctx)).await {
                        Ok(Ok(outcome)) => Ok(outcome),
                        Ok(Err(err)) => Err(StepError::Collaborator(err)),
                        Err(_) => Err(StepError::ExecutionTimeout {
                            timeout: step_timeout,
                        }),
                    };
                (task, index, result)
            });
        }

        let mut any_failed = false;
        while let Some((task, index, result)) = in_flight.next().await {
            match result {
                Ok(outcome) => {
                    self.complete_step(session, &task, index, outcome).await?;
                }
                Err(err) => {
                    any_failed = true;
                    self.fail_step(session, run, &task, &err).await?;
                }
            }
        }
        Ok(any_failed)
    }

    async fn complete_step(
        &self,
        session: &Arc<SessionRuntime>,
        task: &Task,
        index: usize,
        outcome: StepOutcome,
    ) -> Result<(), StoreError> {
        {
            let mut state = session.state.write().await;
            state.set_status(&task.id, TaskStatus::Completed);
            state.record_output(&task.id, outcome.content.clone());
        }
        tracing::info!(
            session_id = %session.session_id(),
            task_id = %task.id,
            output = %truncate_for_log(&outcome.content, MAX_LOG_TEXT_CHARS),
            "task execution completed"
        );
        session
            .publish(ProgressEvent::step_completed(
                session.session_id(),
                task.id.clone(),
                index,
                outcome.content,
            ))
            .await?;

        for file in outcome.produced_files {
            match session.artifacts.register(&file.filename, &file.content).await {
                Ok(record) => {
                    tracing::info!(
                        session_id = %session.session_id(),
                        task_id = %task.id,
                        filename = %record.filename,
                        version = record.version,
                        "artifact registered"
                    );
                    session
                        .publish(ProgressEvent::artifact_updated(
                            session.session_id(),
                            record.filename,
                            record.content,
                            record.version,
                        ))
                        .await?;
                }
                // A bad filename loses the file, not the task.
                Err(ArtifactError::InvalidName(reason)) => {
                    tracing::warn!(
                        session_id = %session.session_id(),
                        task_id = %task.id,
                        filename = %file.filename,
                        "produced file rejected: {}",
                        reason
                    );
                }
                Err(ArtifactError::Store(err)) => return Err(err),
            }
        }
        Ok(())
    }

    /// Mark a task failed and skip everything downstream of it.
    ///
    /// The downstream closure is computed once from the dependency graph;
    /// skips are published in dispatch order, each attributed to the direct
    /// dependency that blocked the task.
    async fn fail_step(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
        task: &Task,
        error: &StepError,
    ) -> Result<(), StoreError> {
        let message = error.to_string();
        session
            .state
            .write()
            .await
            .set_status(&task.id, TaskStatus::Failed);
        tracing::warn!(
            session_id = %session.session_id(),
            task_id = %task.id,
            error = %truncate_for_log(&message, MAX_LOG_TEXT_CHARS),
            "task execution failed"
        );
        session
            .publish(ProgressEvent::step_failed(
                session.session_id(),
                task.id.clone(),
                message,
            ))
            .await?;

        let affected = downstream_closure(&run.plan, &task.id);
        for id in run.order.iter().filter(|id| affected.contains(*id)) {
            let blocker = {
                let state = session.state.read().await;
                if state.status_of(id) != TaskStatus::Pending {
                    continue;
                }
                run.plan.get_task(id).and_then(|t| {
                    t.dependencies
                        .iter()
                        .find(|dep| state.status_of(dep).blocks_dependents())
                        .cloned()
                })
            };
            session
                .state
                .write()
                .await
                .set_status(id, TaskStatus::Skipped);
            tracing::info!(
                session_id = %session.session_id(),
                task_id = %id,
                blocked_by = %task.id,
                "task skipped"
            );
            session
                .publish(ProgressEvent::step_skipped(
                    session.session_id(),
                    id.clone(),
                    blocker,
                ))
                .await?;
        }
        Ok(())
    }

    /// Skip every remaining pending task after an aborting failure
    async fn abort_remaining(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
    ) -> Result<(), StoreError> {
        for id in &run.order {
            {
                let mut state = session.state.write().await;
                if state.status_of(id) != TaskStatus::Pending {
                    continue;
                }
                state.set_status(id, TaskStatus::Skipped);
            }
            tracing::info!(
                session_id = %session.session_id(),
                task_id = %id,
                "task skipped by abort policy"
            );
            session
                .publish(ProgressEvent::step_skipped(
                    session.session_id(),
                    id.clone(),
                    None,
                ))
                .await?;
        }
        Ok(())
    }

    /// No task is ready yet pending tasks remain. Unreachable for a
    /// validated plan; fail whatever is left so the run still terminates.
    async fn fail_unschedulable(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
    ) -> Result<(), StoreError> {
        tracing::error!(
            session_id = %session.session_id(),
            "no ready tasks but run not completed"
        );
        for id in &run.order {
            {
                let mut state = session.state.write().await;
                if state.status_of(id) != TaskStatus::Pending {
                    continue;
                }
                state.set_status(id, TaskStatus::Failed);
            }
            session
                .publish(ProgressEvent::step_failed(
                    session.session_id(),
                    id.clone(),
                    "task was never ready to run",
                ))
                .await?;
        }
        Ok(())
    }

    /// Cancellation observed between batches: skip the rest, keep partial
    /// results, end in the Error phase.
    async fn cancel_remaining(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
    ) -> Result<(), StoreError> {
        for id in &run.order {
            {
                let mut state = session.state.write().await;
                if state.status_of(id) != TaskStatus::Pending {
                    continue;
                }
                state.set_status(id, TaskStatus::Skipped);
            }
            session
                .publish(ProgressEvent::step_skipped(
                    session.session_id(),
                    id.clone(),
                    None,
                ))
                .await?;
        }

        let report = {
            let state = session.state.read().await;
            summary_report(
                &run.plan,
                &run.order,
                &state.task_statuses,
                &state.step_outputs,
            )
        };
        {
            let mut state = session.state.write().await;
            state.set_final_result(report);
        }
        self.enter_error_phase(session).await;
        tracing::info!(session_id = %session.session_id(), "workflow run cancelled");
        session
            .publish(ProgressEvent::error(
                session.session_id(),
                "Workflow cancelled",
            ))
            .await?;
        Ok(())
    }

    /// Every task is terminal: produce the final result and close the run
    async fn finalize(
        &self,
        session: &Arc<SessionRuntime>,
        run: &RunPlan,
    ) -> Result<(), StoreError> {
        let (succeeded, statuses, outputs) = {
            let state = session.state.read().await;
            (
                state.run_succeeded(),
                state.task_statuses.clone(),
                state.step_outputs.clone(),
            )
        };

        let final_result = if succeeded {
            match &self.synthesizer {
                Some(synthesizer) => {
                    match synthesizer
                        .synthesize(&run.request, &run.plan, &outputs)
                        .await
                    {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!(
                                session_id = %session.session_id(),
                                error = %err,
                                "result synthesis failed, falling back to summary report"
                            );
                            summary_report(&run.plan, &run.order, &statuses, &outputs)
                        }
                    }
                }
                None => summary_report(&run.plan, &run.order, &statuses, &outputs),
            }
        } else {
            let failed: Vec<String> = run
                .plan
                .tasks
                .iter()
                .filter(|task| statuses.get(&task.id) == Some(&TaskStatus::Failed))
                .map(|task| task.id.to_string())
                .collect();
            format!(
                "Workflow failed. See logs for details. Failed tasks: {}\n\n{}",
                failed.join(", "),
                summary_report(&run.plan, &run.order, &statuses, &outputs)
            )
        };

        {
            let mut state = session.state.write().await;
            match transition(state.phase, PhaseEvent::AllTasksTerminal) {
                Ok(next) => state.set_phase(next),
                Err(err) => {
                    tracing::error!(
                        session_id = %session.session_id(),
                        error = %err,
                        "run finished outside the Executing phase"
                    );
                }
            }
            state.set_final_result(final_result.clone());
        }
        tracing::info!(
            session_id = %session.session_id(),
            succeeded = succeeded,
            "workflow run finished"
        );
        session
            .publish(ProgressEvent::workflow_completed(
                session.session_id(),
                final_result,
            ))
            .await?;
        Ok(())
    }

    async fn enter_error_phase(&self, session: &Arc<SessionRuntime>) {
        let mut state = session.state.write().await;
        if let Ok(next) = transition(state.phase, PhaseEvent::FatalError) {
            state.set_phase(next);
        }
    }

    async fn fail_session(&self, session: &Arc<SessionRuntime>, err: &StoreError) {
        tracing::error!(
            session_id = %session.session_id(),
            error = %err,
            "workflow run aborted by store failure"
        );
        self.enter_error_phase(session).await;
        if let Err(publish_err) = session
            .publish(ProgressEvent::error(session.session_id(), err.to_string()))
            .await
        {
            tracing::error!(
                session_id = %session.session_id(),
                error = %publish_err,
                "failed to publish run abort"
            );
        }
    }
}

/// Deterministic fallback report over statuses and recorded outputs.
///
/// Status lines follow plan order; completed outputs follow execution
/// order. Used when no synthesizer is attached, when synthesis fails, and
/// as the body of the failed-run result.
fn summary_report(
    plan: &Plan,
    order: &[TaskId],
    statuses: &HashMap<TaskId, TaskStatus>,
    outputs: &HashMap<TaskId, String>,
) -> String {
    let mut report = String::from("Workflow Execution Summary:\n\n");
    report.push_str("Task Statuses:\n");
    for task in &plan.tasks {
        let status = statuses
            .get(&task.id)
            .copied()
            .unwrap_or(TaskStatus::Pending);
        report.push_str(&format!(
            "- {} (ID: {}): {}\n",
            task.title,
            task.id,
            status.as_str()
        ));
    }
    report.push_str("\nCompleted Task Results:\n");
    let mut any_results = false;
    for id in order {
        let Some(task) = plan.get_task(id) else {
            continue;
        };
        if let Some(output) = outputs.get(id) {
            any_results = true;
            report.push_str(&format!(
                "--- Result for '{}' (ID: {}) ---\n{}\n\n",
                task.title, id, output
            ));
        }
    }
    if !any_results {
        report.push_str("No task results were successfully recorded.\n");
    }
    report
}
