use std::sync::Arc;
use std::time::Instant;

use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;

use forgelet_config::{OrchestratorConfig, RetryConfig};

use crate::agents::{EvaluatorAgent, ExecutorAgent, FixerAgent, ManagerAgent, ReviewerAgent};
use crate::coordinator::{Coordinator, Role};
use crate::dag::TaskDag;
use crate::error::{OrchestratorError, Result};
use crate::pool::PoolSet;
use crate::task::{Execution, FinalReport, Review, ReviewResult, Task, TaskStatus};

/// The five phases of one workflow run (C10 step machine). `Execute` is
/// itself a loop containing the review-retry-fix cycle for every task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Analyze,
    Coordinate,
    Execute,
    Evaluate,
    Report,
}

/// A typed progress event the Workflow driver emits as it advances, so a
/// caller (CLI, TUI, test harness) can observe run progress without polling
/// the Coordinator directly.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    PhaseStarted(WorkflowPhase),
    TaskScheduled { task_id: crate::task::TaskId },
    TaskCompleted { task_id: crate::task::TaskId },
    TaskFailed { task_id: crate::task::TaskId },
    ReviewFailed { task_id: crate::task::TaskId, attempt: u32 },
    PhaseFinished(WorkflowPhase),
}

/// C10: wires the Manager/Executor/Reviewer/Fixer/Evaluator role agents to
/// the Coordinator (C8) and Tool Execution Engine (C4), and drives the
/// Analyze -> Coordinate -> Execute(review/retry/fix) -> Evaluate -> Report
/// phase sequence to a [`FinalReport`].
pub struct WorkflowDriver {
    manager: ManagerAgent,
    executor: ExecutorAgent,
    reviewer: ReviewerAgent,
    fixer: FixerAgent,
    evaluator: EvaluatorAgent,
    pools: PoolSet,
    retry: RetryConfig,
    events: tokio::sync::mpsc::UnboundedSender<WorkflowEvent>,
    cancellation: CancellationToken,
}

pub struct WorkflowHandles {
    pub driver: WorkflowDriver,
    pub events: tokio::sync::mpsc::UnboundedReceiver<WorkflowEvent>,
}

impl WorkflowDriver {
    pub fn new(
        manager: ManagerAgent,
        executor: ExecutorAgent,
        reviewer: ReviewerAgent,
        fixer: FixerAgent,
        evaluator: EvaluatorAgent,
        config: &OrchestratorConfig,
    ) -> WorkflowHandles {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let driver = Self {
            manager,
            executor,
            reviewer,
            fixer,
            evaluator,
            pools: PoolSet::new(&config.pools),
            retry: config.retry.clone(),
            events: tx,
            cancellation: CancellationToken::new(),
        };
        WorkflowHandles { driver, events: rx }
    }

    fn emit(&self, event: WorkflowEvent) {
        let _ = self.events.send(event);
    }

    /// A handle a caller (CLI signal handler, test harness) can cancel to
    /// make the next `run()` poll return `Err(OrchestratorError::Cancelled)`
    /// instead of scheduling further tasks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub async fn run(&self, goal: &str) -> Result<FinalReport> {
        let wall_start = Instant::now();
        self.emit(WorkflowEvent::PhaseStarted(WorkflowPhase::Analyze));
        let plan = self.manager.plan(goal).await?;
        self.emit(WorkflowEvent::PhaseFinished(WorkflowPhase::Analyze));

        self.emit(WorkflowEvent::PhaseStarted(WorkflowPhase::Coordinate));
        let dag = TaskDag::new(plan.tasks.clone())?;
        let coordinator = Arc::new(Coordinator::new(dag, self.pools.clone()));
        self.emit(WorkflowEvent::PhaseFinished(WorkflowPhase::Coordinate));

        self.emit(WorkflowEvent::PhaseStarted(WorkflowPhase::Execute));
        let mut report = FinalReport::new(plan.clone());

        loop {
            if self.cancellation.is_cancelled() {
                return Err(OrchestratorError::Cancelled);
            }

            let ready = coordinator.ready_set();
            if ready.is_empty() {
                if plan
                    .tasks
                    .iter()
                    .all(|task| coordinator.status_of(&task.id).map(TaskStatus::is_terminal).unwrap_or(true))
                {
                    break;
                }
                let notify = coordinator.notify_handle();
                tokio::select! {
                    _ = self.cancellation.cancelled() => return Err(OrchestratorError::Cancelled),
                    result = timeout(Duration::from_secs(5), notify.notified()) => {
                        if result.is_err() {
                            break;
                        }
                    }
                }
                continue;
            }

            // Every task in this round is scheduled up front (so its
            // Executor permit and resource locks are reserved before any of
            // them start running) and then driven to completion
            // concurrently, rather than one at a time - `Coordinator` is the
            // thing enforcing resource-lock and pool-capacity correctness
            // across the concurrent set, not this loop.
            let mut handles = Vec::new();
            for task_id in ready {
                let Some(mut task) = plan.tasks.iter().find(|task| task.id == task_id).cloned() else {
                    continue;
                };
                let Some(scheduled) = coordinator.try_schedule_task(task_id, Role::Executor) else {
                    continue;
                };
                self.emit(WorkflowEvent::TaskScheduled { task_id });
                coordinator.set_status(task_id, TaskStatus::Executing);
                task.mark_started();

                let coordinator = Arc::clone(&coordinator);
                let manager = self.manager.clone();
                let executor = self.executor.clone();
                let reviewer = self.reviewer.clone();
                let fixer = self.fixer.clone();
                let retry = self.retry.clone();
                let events = self.events.clone();
                let plan_for_replan = plan.clone();

                handles.push(tokio::spawn(async move {
                    let _scheduled = scheduled;
                    let outcome = run_task_with_retries(
                        &manager,
                        &executor,
                        &reviewer,
                        &fixer,
                        &events,
                        &retry,
                        &coordinator,
                        &plan_for_replan,
                        &task,
                    )
                    .await;
                    (task, outcome)
                }));
            }

            for handle in handles {
                let (mut task, outcome) = handle
                    .await
                    .map_err(|err| OrchestratorError::InvalidGraph(format!("task worker panicked: {err}")))?;
                task.mark_completed_at_now();

                let (executions, reviews, passed) = match outcome {
                    Ok((executions, reviews)) => (executions, reviews, true),
                    Err((executions, reviews)) => (executions, reviews, false),
                };
                task.retries = executions.len().saturating_sub(1) as u32;
                task.status = if passed { TaskStatus::Completed } else { TaskStatus::Failed };

                report.executions.extend(executions);
                report.reviews.extend(reviews);
                if let Some(stored) = report.plan.tasks.iter_mut().find(|t| t.id == task.id) {
                    *stored = task.clone();
                }

                if passed {
                    coordinator.mark_completed(task.id);
                    self.emit(WorkflowEvent::TaskCompleted { task_id: task.id });
                } else {
                    coordinator.mark_failed(task.id);
                    self.emit(WorkflowEvent::TaskFailed { task_id: task.id });
                }
            }
        }
        self.emit(WorkflowEvent::PhaseFinished(WorkflowPhase::Execute));

        self.emit(WorkflowEvent::PhaseStarted(WorkflowPhase::Evaluate));
        let evaluation = self
            .evaluator
            .evaluate(&plan, &report.executions, &report.reviews)
            .await?;
        report.evaluation = Some(evaluation);
        self.emit(WorkflowEvent::PhaseFinished(WorkflowPhase::Evaluate));

        self.emit(WorkflowEvent::PhaseStarted(WorkflowPhase::Report));
        for execution in &report.executions {
            // token counters are rolled up here rather than per-agent, since
            // only the Workflow driver sees every role's usage.
            report.total_input_tokens += execution.input_tokens;
            report.total_output_tokens += execution.output_tokens;
        }
        report.finalize_totals(wall_start.elapsed());
        self.emit(WorkflowEvent::PhaseFinished(WorkflowPhase::Report));

        Ok(report)
    }
}

/// Runs one task through execute -> review, retrying via the Fixer up to
/// `retry.max_retries` times when review fails and `retry.auto_fix` permits
/// it. Every Execution and Review produced along the way is retained in
/// order - the Executor's original attempt is never discarded when the
/// Fixer runs. A `ReviewResult::Replan` never reaches the Fixer: it means
/// the task's approach itself is wrong, so the task fails immediately with
/// a "requires replanning" reason instead of being patched.
#[allow(clippy::too_many_arguments)]
async fn run_task_with_retries(
    manager: &ManagerAgent,
    executor: &ExecutorAgent,
    reviewer: &ReviewerAgent,
    fixer: &FixerAgent,
    events: &tokio::sync::mpsc::UnboundedSender<WorkflowEvent>,
    retry: &RetryConfig,
    coordinator: &Coordinator,
    plan: &crate::task::TaskPlan,
    task: &Task,
) -> std::result::Result<(Vec<Execution>, Vec<Review>), (Vec<Execution>, Vec<Review>)> {
    let mut executions = Vec::new();
    let mut reviews: Vec<Review> = Vec::new();

    let Ok(execution) = executor.execute(task).await else {
        return Err((executions, reviews));
    };
    executions.push(execution);

    coordinator.set_status(task.id, TaskStatus::InReview);
    let review_permit = coordinator.acquire_role_permit(Role::Reviewer).await;
    let Ok(review) = reviewer.review(task, executions.last().expect("just pushed")).await else {
        drop(review_permit);
        return Err((executions, reviews));
    };
    drop(review_permit);
    reviews.push(review);

    for attempt in 1..=retry.max_retries {
        let last_result = reviews.last().expect("at least one review").result;
        if last_result == ReviewResult::Pass {
            return Ok((executions, reviews));
        }
        if last_result == ReviewResult::Replan {
            // Recorded for the report and for a future planning pass; this
            // driver loop does not splice the replacement plan back into
            // the running DAG mid-execution.
            let _ = manager.replan(plan, task, reviews.last().expect("at least one review")).await;
            if let Some(last) = executions.last_mut() {
                last.success = false;
                last.error.get_or_insert_with(|| "requires replanning".to_string());
            }
            return Err((executions, reviews));
        }
        if !(retry.auto_fix && reviews.last().expect("at least one review").can_auto_fix()) {
            return Err((executions, reviews));
        }

        let _ = events.send(WorkflowEvent::ReviewFailed {
            task_id: task.id,
            attempt,
        });
        coordinator.set_status(task.id, TaskStatus::Fixing);
        let fix_permit = coordinator.acquire_role_permit(Role::Fixer).await;
        let last_review = reviews.last().expect("at least one review").clone();
        let fix_result = fixer
            .fix(task, executions.last().expect("at least one execution"), &last_review)
            .await;
        drop(fix_permit);
        let Ok(fixed) = fix_result else {
            return Err((executions, reviews));
        };
        executions.push(fixed);

        coordinator.set_status(task.id, TaskStatus::InReview);
        let review_permit = coordinator.acquire_role_permit(Role::Reviewer).await;
        let review_result = reviewer.review(task, executions.last().expect("just pushed")).await;
        drop(review_permit);
        let Ok(review) = review_result else {
            return Err((executions, reviews));
        };
        reviews.push(review);
    }

    if reviews.last().expect("at least one review").passed() {
        Ok((executions, reviews))
    } else {
        Err((executions, reviews))
    }
}


/// Resolves the concrete model identifier a role should use: its entry in
/// `roles` (falling back to `"default"`), looked up through `models`. Falls
/// back to the alias itself if no alias table entry matches, so an
/// orchestrator config with no `[models]` section still works against a
/// provider that accepts bare names.
pub fn resolve_model(config: &OrchestratorConfig, role: &str) -> String {
    let alias = config.roles.model_for(role);
    config.models.resolve(alias).unwrap_or(alias).to_string()
}
