//! Provider-agnostic contract for streaming LLM completions (C1). No
//! concrete backend lives here - only the request/message/tool/response
//! types and the `LLMProvider` trait every role agent talks to.

pub mod message;
pub mod provider;
pub mod request;
pub mod response;
pub mod schema;
pub mod tool;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use message::{ContentBlock, Message, MessageRole};
pub use provider::{EventStream, LLMError, LLMProvider};
pub use request::{Request, ToolChoice};
pub use response::{CompletionSummary, DeltaBlock, FinishReason, StreamingEvent, Usage, apply_delta};
pub use schema::clean_schema_for_provider;
pub use tool::{ToolCall, ToolDefinition};
