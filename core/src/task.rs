use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// A task's place in its status-transition diagram (§3): forward-only,
/// except for `Cancelled`, which any non-terminal status can transition to
/// when cascading cancellation (C8) fires on a failed dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Ready,
    Scheduled,
    Executing,
    InReview,
    Fixing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether transitioning from `self` to `next` is ever legal, ignoring
    /// cascading cancellation (handled separately since it can fire from any
    /// non-terminal state).
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, Ready)
                | (Ready, Scheduled)
                | (Scheduled, Executing)
                | (Executing, InReview)
                | (InReview, Completed)
                | (InReview, Fixing)
                | (InReview, Failed)
                | (Fixing, InReview)
                | (Fixing, Failed)
        )
    }
}

/// One unit of work in the Task DAG. `dependencies` and `resources` are
/// fixed at planning time and never mutated afterward (§3 invariant:
/// immutable dependency/resource sets post-planning).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub dependencies: Vec<TaskId>,
    pub resources: Vec<PathBuf>,
    pub priority: i32,
    pub status: TaskStatus,
    pub retries: u32,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// `description` doubles as the default title; call `.with_title(...)`
    /// to give it a separate short title.
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            id: Uuid::new_v4(),
            title: description.clone(),
            description,
            dependencies: Vec::new(),
            resources: Vec::new(),
            priority: 3,
            status: TaskStatus::Pending,
            retries: 0,
            labels: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_resources(mut self, resources: Vec<PathBuf>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Records that the task started running now, for the per-task
    /// duration summary in the [`FinalReport`].
    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed_at_now(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock time spent on this task so far, or zero if it never
    /// started.
    pub fn duration(&self) -> Duration {
        match (self.started_at, self.completed_at.or(Some(Utc::now()))) {
            (Some(start), Some(end)) if end > start => (end - start).to_std().unwrap_or_default(),
            _ => Duration::default(),
        }
    }
}

/// The full set of tasks produced by the Manager role agent (C9), forming
/// the DAG the Coordinator (C8) schedules over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    pub id: Uuid,
    pub requirement: String,
    pub analysis: String,
    pub tasks: Vec<Task>,
    pub creator_model: String,
    pub created_at: DateTime<Utc>,
}

impl Default for TaskPlan {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            requirement: String::new(),
            analysis: String::new(),
            tasks: Vec::new(),
            creator_model: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A single tool call made during a task's execution, retained for the
/// Tool Execution Context (§3) and for auditing in the FinalReport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsage {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub result_summary: String,
    pub is_error: bool,
    pub duration_ms: u64,
}

/// Record of an Executor or Fixer role agent's run over one task.
/// `mutated_files` must be a subset of `task.resources` (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub task_id: TaskId,
    pub executor_id: String,
    pub tool_usages: Vec<ToolUsage>,
    pub mutated_files: Vec<PathBuf>,
    pub summary: String,
    pub success: bool,
    pub error: Option<String>,
    pub iterations: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Bug,
    Security,
    Style,
    Performance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIssue {
    pub severity: IssueSeverity,
    pub kind: IssueKind,
    pub description: String,
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

/// The three-way review outcome (§3, §4.9, §4.10). `Replan` routes back to
/// `ManagerAgent::replan` instead of the Fixer - it means the task itself is
/// wrong, not just its execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewResult {
    Pass,
    Fail,
    Replan,
}

/// Output of a Reviewer role agent's pass over an Execution. `result=Pass`
/// is only ever produced when `issues` contains no `Major`/`Critical` entry
/// (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub reviewer_id: String,
    pub task_id: TaskId,
    pub result: ReviewResult,
    pub score: u8,
    pub comments: String,
    pub issues: Vec<ReviewIssue>,
    pub auto_fixable: bool,
    pub fix_suggestion: Option<String>,
}

impl Review {
    /// Derives `result` from issue severities the model reported, the way
    /// the Reviewer agent builds its response: any critical/major issue
    /// fails the review, otherwise it passes. Replan is never inferred this
    /// way - only the Reviewer's explicit `result` field produces it.
    pub fn from_issues(
        execution_id: Uuid,
        task_id: TaskId,
        reviewer_id: impl Into<String>,
        score: u8,
        comments: impl Into<String>,
        issues: Vec<ReviewIssue>,
        auto_fixable: bool,
        fix_suggestion: Option<String>,
    ) -> Self {
        let has_blocking = issues
            .iter()
            .any(|issue| matches!(issue.severity, IssueSeverity::Major | IssueSeverity::Critical));
        Self {
            id: Uuid::new_v4(),
            execution_id,
            reviewer_id: reviewer_id.into(),
            task_id,
            result: if has_blocking { ReviewResult::Fail } else { ReviewResult::Pass },
            score,
            comments: comments.into(),
            issues,
            auto_fixable,
            fix_suggestion,
        }
    }

    pub fn passed(&self) -> bool {
        self.result == ReviewResult::Pass
    }

    /// Gate for the review-retry-fix loop (§4.10): a review can only route
    /// to the Fixer when it failed (not replanned) and the reviewer marked
    /// it auto-fixable.
    pub fn can_auto_fix(&self) -> bool {
        self.result == ReviewResult::Fail && self.auto_fixable
    }
}

/// Output of the Evaluator role agent over the whole completed plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub plan_id: Uuid,
    pub meets_requirement: bool,
    pub quality_score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Per-task rollup in the [`FinalReport`] (§3: "per-task summaries").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub retries: u32,
    pub duration_ms: u64,
}

impl TaskSummary {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id,
            title: task.title.clone(),
            status: task.status,
            retries: task.retries,
            duration_ms: task.duration().as_millis() as u64,
        }
    }
}

/// Aggregate counters in the [`FinalReport`] (§3: "totals").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub retries: u32,
    pub wall_duration_ms: u64,
}

/// The Workflow driver's terminal artifact (C10 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub plan: TaskPlan,
    pub executions: Vec<Execution>,
    pub reviews: Vec<Review>,
    pub evaluation: Option<Evaluation>,
    pub task_summaries: Vec<TaskSummary>,
    pub totals: ReportTotals,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub generated_at: DateTime<Utc>,
    pub orchestrator_version: String,
}

impl FinalReport {
    pub fn new(plan: TaskPlan) -> Self {
        Self {
            plan,
            executions: Vec::new(),
            reviews: Vec::new(),
            evaluation: None,
            task_summaries: Vec::new(),
            totals: ReportTotals::default(),
            total_input_tokens: 0,
            total_output_tokens: 0,
            generated_at: Utc::now(),
            orchestrator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Rolls per-task summaries and aggregate totals up from `plan.tasks`
    /// and `reviews`, using each task's current status/retries/timestamps.
    /// Called once by the driver right before it renders the report (C10
    /// step 5), after every task has reached a terminal status.
    pub fn finalize_totals(&mut self, wall_duration: Duration) {
        self.task_summaries = self.plan.tasks.iter().map(TaskSummary::from_task).collect();

        let mut totals = ReportTotals {
            tasks: self.plan.tasks.len(),
            wall_duration_ms: wall_duration.as_millis() as u64,
            ..ReportTotals::default()
        };
        for task in &self.plan.tasks {
            totals.retries += task.retries;
            match task.status {
                TaskStatus::Completed => totals.completed += 1,
                TaskStatus::Failed => totals.failed += 1,
                TaskStatus::Cancelled => totals.cancelled += 1,
                _ => {}
            }
        }
        self.totals = totals;
    }
}
