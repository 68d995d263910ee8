//! Tool registry, execution context, permission manager, and hook execution
//! (C2, C3) - the parts of the tool surface that are not a concrete tool
//! body. Concrete bodies (file read/write, shell exec, grep, LSP, web
//! fetch, notebook editing, MCP bridges) are out of scope and live, if ever,
//! in a downstream crate that implements the `Tool` trait defined here.

pub mod builder;
pub mod execution_context;
pub mod hooks;
pub mod permissions;
pub mod registry;

#[cfg(any(test, feature = "test-util"))]
pub mod test_tools;

pub use builder::ToolResponseBuilder;
pub use execution_context::{ToolCallHistory, ToolExecutionContext, ToolExecutionRecord, ToolPattern};
pub use hooks::{
    HookAction, HookConfig, HookConfigError, HookDefinition, HookEvent, HookMatcher, HookOutcome,
    HookRunner, HookType, ProcessHookRunner, run_pre_tool_use_hooks,
};
pub use permissions::{AskCallback, AutoDenyCallback, PermissionManager, RuleAction};
pub use registry::{FilteredRegistry, Tool, ToolRegistry, ToolResult};
