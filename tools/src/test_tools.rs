//! Trivial tools that exist only to drive the Tool Execution Engine and
//! Permission Manager test suites - no concrete tool body ships in this
//! crate otherwise.

use async_trait::async_trait;

use crate::builder::ToolResponseBuilder;
use crate::execution_context::ToolExecutionContext;
use crate::registry::{Tool, ToolResult};

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the `message` field of its input back as the result."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"],
        })
    }

    fn validate(&self, input: &serde_json::Value) -> Option<String> {
        if input.get("message").and_then(|v| v.as_str()).is_none() {
            return Some("missing required field `message`".to_string());
        }
        None
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, input: serde_json::Value) -> ToolResult {
        let message = input
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        ToolResponseBuilder::new().stdout(message).build()
    }
}

pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "Always returns a tool error, for exercising retry/fix paths."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object" })
    }

    async fn execute(&self, _ctx: &ToolExecutionContext, _input: serde_json::Value) -> ToolResult {
        ToolResponseBuilder::new().stderr("simulated failure").error().build()
    }
}
