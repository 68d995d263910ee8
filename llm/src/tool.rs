use serde::{Deserialize, Serialize};

/// A tool definition offered to the model, projected from the Tool Registry
/// (C2) via `to_api_tools()`. The provider contract only needs name,
/// description, and an input JSON schema - concrete tool bodies live outside
/// this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A request from the model to invoke a tool, carried inside a
/// `ContentBlock::ToolUse` once a streaming turn finishes accumulating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn parsed_arguments<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.arguments.clone())
    }
}
