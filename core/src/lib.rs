//! Workflow orchestrator and tool execution engine core.
//!
//! This crate wires five things together: a tolerant JSON-schema-contracted
//! role-agent layer (`agents`), a tool-calling turn loop (`engine`), a
//! dependency-graph scheduler over bounded worker pools (`dag`, `pool`,
//! `resource_lock`, `coordinator`), the data model both of those operate on
//! (`task`), and the phase machine that drives a full run end to end
//! (`workflow`). Concrete LLM backends and concrete tool bodies are out of
//! scope - see `forgelet-llm` and `forgelet-tools` for the contracts they'd
//! implement.

pub mod agents;
pub mod coordinator;
pub mod dag;
pub mod engine;
pub mod error;
pub mod pool;
pub mod resource_lock;
pub mod task;
pub mod workflow;

pub use coordinator::{Coordinator, Role, ScheduledTask};
pub use dag::TaskDag;
pub use engine::{EngineOutcome, ToolExecutionEngine};
pub use error::{OrchestratorError, Result};
pub use pool::{PoolPermit, PoolSet, WorkerPool};
pub use resource_lock::ResourceLock;
pub use task::{
    Evaluation, Execution, FinalReport, IssueKind, IssueSeverity, ReportTotals, Review,
    ReviewIssue, ReviewResult, Task, TaskId, TaskPlan, TaskStatus, TaskSummary, ToolUsage,
};
pub use workflow::{WorkflowDriver, WorkflowEvent, WorkflowHandles, WorkflowPhase};
