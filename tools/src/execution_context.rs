use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use forgelet_config::PermissionMode;
use serde_json::Value;

use crate::permissions::RuleAction;
use crate::registry::ToolResult;

const HISTORY_CAPACITY: usize = 50;
const REDUNDANCY_WINDOW: usize = 5;

/// Per-call value threaded through a single tool invocation (§3 Tool
/// Execution Context): session identity, the directories the call is
/// scoped to, the permission mode in effect, and the two callbacks a tool
/// body may use to ask for escalated permission or to stream output back
/// to the caller. Immutable for the duration of that one invocation - a
/// tool never mutates its own context, it only reads from it.
#[derive(Clone)]
pub struct ToolExecutionContext {
    pub session_id: String,
    pub working_directory: PathBuf,
    pub project_root: PathBuf,
    pub permission_mode: PermissionMode,
    permission_request: Arc<dyn Fn(&str, &str) -> RuleAction + Send + Sync>,
    output: Arc<dyn Fn(&str) + Send + Sync>,
}

impl ToolExecutionContext {
    pub fn new(
        session_id: impl Into<String>,
        working_directory: PathBuf,
        project_root: PathBuf,
        permission_mode: PermissionMode,
        permission_request: Arc<dyn Fn(&str, &str) -> RuleAction + Send + Sync>,
        output: Arc<dyn Fn(&str) + Send + Sync>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            working_directory,
            project_root,
            permission_mode,
            permission_request,
            output,
        }
    }

    /// A context with an auto-deny permission callback and a discarding
    /// output callback, for tests and non-interactive runs where escalation
    /// is never granted mid-call.
    pub fn headless(
        session_id: impl Into<String>,
        working_directory: PathBuf,
        project_root: PathBuf,
        permission_mode: PermissionMode,
    ) -> Self {
        Self::new(
            session_id,
            working_directory,
            project_root,
            permission_mode,
            Arc::new(|_tool, _subject| RuleAction::Deny),
            Arc::new(|_text| {}),
        )
    }

    /// Invoked by a tool body that needs to ask for permission on a
    /// sub-resource it discovers mid-call (e.g. a shell command that wants
    /// to touch a file outside its declared resources).
    pub fn request_permission(&self, tool_name: &str, subject: &str) -> RuleAction {
        (self.permission_request)(tool_name, subject)
    }

    /// Streams incremental output (e.g. a long-running shell command's
    /// stdout) back to whatever is watching this call.
    pub fn emit_output(&self, text: &str) {
        (self.output)(text)
    }
}

/// One completed tool call, retained for pattern detection across a single
/// task's tool-call history.
#[derive(Debug, Clone)]
pub struct ToolExecutionRecord {
    pub tool_name: String,
    pub arguments: Value,
    pub succeeded: bool,
}

/// Recent-history pattern an engine can surface to a role agent to nudge it
/// away from repeating itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPattern {
    /// The same tool with equivalent arguments was just called.
    Redundant { tool_name: String },
    /// A tool has failed every time it has been tried in the window.
    ConsistentFailure { tool_name: String },
}

/// Bounded rolling history of tool calls for one Execution, used to detect
/// redundant calls and failing tools before they are retried blindly. Not
/// the per-call Tool Execution Context (§3) - see [`ToolExecutionContext`]
/// above for that.
#[derive(Debug, Default)]
pub struct ToolCallHistory {
    history: VecDeque<ToolExecutionRecord>,
}

impl ToolCallHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tool_name: impl Into<String>, arguments: Value, result: &ToolResult) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(ToolExecutionRecord {
            tool_name: tool_name.into(),
            arguments,
            succeeded: !result.is_error,
        });
    }

    pub fn recent_tools(&self, n: usize) -> Vec<&str> {
        self.history
            .iter()
            .rev()
            .take(n)
            .map(|record| record.tool_name.as_str())
            .collect()
    }

    /// True if the proposed call repeats the most recent call to the same
    /// tool with equivalent arguments.
    pub fn is_redundant(&self, tool_name: &str, arguments: &Value) -> bool {
        self.history
            .back()
            .map(|last| last.tool_name == tool_name && are_args_equivalent(&last.arguments, arguments))
            .unwrap_or(false)
    }

    pub fn patterns(&self) -> Vec<ToolPattern> {
        let mut patterns = Vec::new();
        let window: Vec<_> = self.history.iter().rev().take(REDUNDANCY_WINDOW).collect();

        if let (Some(last), Some(second_last)) = (window.first(), window.get(1)) {
            if last.tool_name == second_last.tool_name
                && are_args_equivalent(&last.arguments, &second_last.arguments)
            {
                patterns.push(ToolPattern::Redundant {
                    tool_name: last.tool_name.clone(),
                });
            }
        }

        if let Some(first) = window.first() {
            let all_failed = window
                .iter()
                .filter(|record| record.tool_name == first.tool_name)
                .all(|record| !record.succeeded);
            if all_failed && !first.succeeded {
                patterns.push(ToolPattern::ConsistentFailure {
                    tool_name: first.tool_name.clone(),
                });
            }
        }

        patterns
    }
}

/// Structural equality ignoring key order, since two JSON objects with the
/// same fields in a different order represent the same tool call.
pub fn are_args_equivalent(a: &Value, b: &Value) -> bool {
    a == b
}
