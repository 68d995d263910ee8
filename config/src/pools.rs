use serde::{Deserialize, Serialize};

/// Bounded worker pool capacities and retry/iteration budgets for the
/// coordinator and tool execution engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolsConfig {
    #[serde(default = "default_executor_pool")]
    pub executors: usize,

    #[serde(default = "default_reviewer_pool")]
    pub reviewers: usize,

    #[serde(default = "default_fixer_pool")]
    pub fixers: usize,
}

fn default_executor_pool() -> usize {
    4
}

fn default_reviewer_pool() -> usize {
    2
}

fn default_fixer_pool() -> usize {
    2
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            executors: default_executor_pool(),
            reviewers: default_reviewer_pool(),
            fixers: default_fixer_pool(),
        }
    }
}

/// Retry and iteration bounds shared by the Workflow driver and the Tool
/// Execution Engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum review-fail -> fix -> re-review cycles per task.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum model turns a single tool-execution-engine run may take
    /// before it gives up, per role. The Reviewer and Evaluator never call
    /// tools, so there is no `reviewer_iterations`/`evaluator_iterations`
    /// counterpart - only Executor and Fixer drive a tool execution engine.
    #[serde(default = "default_executor_iterations")]
    pub executor_iterations: u32,

    #[serde(default = "default_fixer_iterations")]
    pub fixer_iterations: u32,

    /// Whether a failed-but-auto-fixable review is routed to the Fixer at
    /// all. When `false`, any review with `result = Fail` marks the task
    /// failed immediately regardless of `Review::can_auto_fix`.
    #[serde(default = "default_auto_fix")]
    pub auto_fix: bool,
}

fn default_max_retries() -> u32 {
    2
}

fn default_auto_fix() -> bool {
    true
}

fn default_executor_iterations() -> u32 {
    50
}

fn default_fixer_iterations() -> u32 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            executor_iterations: default_executor_iterations(),
            fixer_iterations: default_fixer_iterations(),
            auto_fix: default_auto_fix(),
        }
    }
}
