use serde::{Deserialize, Serialize};

use crate::message::ContentBlock;

/// Token accounting for a single request, surfaced on [`crate::response::CompletionSummary`]
/// and rolled up by role agents into their owning Execution/Review/Evaluation
/// record for the FinalReport's cost counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cache_read_tokens: u32,
    pub cache_write_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    ToolUse,
    ContentFilter,
}

/// Incremental text/thinking/tool-input fragments carried by
/// `StreamingEvent::ContentBlockDelta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeltaBlock {
    Text { text: String },
    Thinking { text: String },
    InputJson { partial_json: String },
}

/// The closed tagged union every provider's stream is normalized into.
/// Consumers accumulate `ContentBlockStart`/`ContentBlockDelta`/`ContentBlockStop`
/// events by `index` into a `Vec<ContentBlock>` and finish the turn on
/// `MessageStop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamingEvent {
    MessageStart,
    ContentBlockStart { index: usize, block: ContentBlock },
    ContentBlockDelta { index: usize, delta: DeltaBlock },
    ContentBlockStop { index: usize },
    MessageDelta { stop_reason: Option<FinishReason> },
    MessageStop { usage: Usage },
}

/// The fully-accumulated result of driving a provider's stream to
/// completion, handed back to the Tool Execution Engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

/// Folds a block's delta into its accumulated content. Used by the engine to
/// replay a stream into `content_blocks[index]`.
pub fn apply_delta(block: &mut ContentBlock, delta: &DeltaBlock) {
    match (block, delta) {
        (ContentBlock::Text { text }, DeltaBlock::Text { text: delta_text }) => {
            text.push_str(delta_text);
        }
        (ContentBlock::Thinking { text }, DeltaBlock::Thinking { text: delta_text }) => {
            text.push_str(delta_text);
        }
        (ContentBlock::ToolUse { input, .. }, DeltaBlock::InputJson { partial_json }) => {
            if let serde_json::Value::String(existing) = input {
                existing.push_str(partial_json);
            } else {
                *input = serde_json::Value::String(partial_json.clone());
            }
        }
        _ => {}
    }
}
