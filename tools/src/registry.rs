use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use forgelet_llm::ToolDefinition;
use indexmap::IndexMap;

use crate::execution_context::ToolExecutionContext;

/// Outcome of a single tool invocation. Tool failures (bad args, nonzero
/// exit, IO error) are represented here with `is_error: true` - they are
/// never a Rust `Err`, per the "tool errors are never fatal" contract the
/// Tool Execution Engine relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

/// The C2 contract every concrete tool body (file read/write, shell exec,
/// grep, LSP, web fetch, notebook editing, MCP bridges, ...) implements.
/// None of those bodies live in this crate - only the trait and the registry
/// that holds them.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;

    /// Checks `input` against this tool's constraints before `execute` ever
    /// runs, returning a description of the first violation found. The
    /// default accepts everything - tools with no extra invariants beyond
    /// their JSON schema don't need to override this.
    fn validate(&self, _input: &serde_json::Value) -> Option<String> {
        None
    }

    async fn execute(&self, ctx: &ToolExecutionContext, input: serde_json::Value) -> ToolResult;
}

/// Name -> tool map. Construction order is preserved so `to_api_tools()`
/// presents a stable ordering to the model across turns.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn to_api_tools(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: forgelet_llm::clean_schema_for_provider(&tool.input_schema()),
            })
            .collect()
    }

    /// Derives a registry scoped to a subagent: `allowed` (if non-empty)
    /// restricts to that set, and `disallowed` is always subtracted
    /// afterward, mirroring the spec's subagent tool-filtering rule.
    pub fn filtered(&self, allowed: &[String], disallowed: &[String]) -> FilteredRegistry<'_> {
        FilteredRegistry {
            base: self,
            allowed: if allowed.is_empty() {
                None
            } else {
                Some(allowed.iter().cloned().collect())
            },
            disallowed: disallowed.iter().cloned().collect(),
        }
    }
}

/// A read-only view over a [`ToolRegistry`] restricted to an allow-list
/// and/or a deny-list, used to hand subagents a narrower tool surface than
/// their parent without copying the underlying tools.
pub struct FilteredRegistry<'a> {
    base: &'a ToolRegistry,
    allowed: Option<HashSet<String>>,
    disallowed: HashSet<String>,
}

impl FilteredRegistry<'_> {
    fn is_visible(&self, name: &str) -> bool {
        if self.disallowed.contains(name) {
            return false;
        }
        match &self.allowed {
            Some(allowed) => allowed.contains(name),
            None => true,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        if !self.is_visible(name) {
            return None;
        }
        self.base.get(name)
    }

    pub fn to_api_tools(&self) -> Vec<ToolDefinition> {
        self.base
            .tools
            .values()
            .filter(|tool| self.is_visible(tool.name()))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: forgelet_llm::clean_schema_for_provider(&tool.input_schema()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_tools::EchoTool;

    #[test]
    fn filtered_registry_respects_allow_list() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let filtered = registry.filtered(&["echo".to_string()], &[]);
        assert!(filtered.get("echo").is_some());

        let empty_allow = registry.filtered(&["grep".to_string()], &[]);
        assert!(empty_allow.get("echo").is_none());
    }

    #[test]
    fn disallowed_always_wins_over_allowed() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let filtered = registry.filtered(&["echo".to_string()], &["echo".to_string()]);
        assert!(filtered.get("echo").is_none());
    }

    #[test]
    fn to_api_tools_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs = registry.to_api_tools();
        assert_eq!(defs[0].name, "echo");
    }
}
