//! A reference provider used to drive engine and workflow tests without a
//! real backend, the same role the teacher's example provider plays for its
//! own wiring tests.

use async_trait::async_trait;
use futures::stream;

use crate::provider::{EventStream, LLMError, LLMProvider};
use crate::request::Request;
use crate::response::{FinishReason, StreamingEvent, Usage};

/// Replays a fixed sequence of [`StreamingEvent`]s regardless of the request
/// it receives. Construct one queue per expected call via
/// [`MockProvider::with_scripted_turns`].
pub struct MockProvider {
    name: String,
    turns: std::sync::Mutex<std::collections::VecDeque<Vec<StreamingEvent>>>,
}

impl MockProvider {
    pub fn with_scripted_turns(turns: Vec<Vec<StreamingEvent>>) -> Self {
        Self {
            name: "mock".to_string(),
            turns: std::sync::Mutex::new(turns.into()),
        }
    }

    /// A single-turn provider that immediately returns the given text.
    pub fn with_text_reply(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::with_scripted_turns(vec![vec![
            StreamingEvent::MessageStart,
            StreamingEvent::ContentBlockStart {
                index: 0,
                block: crate::message::ContentBlock::Text { text: String::new() },
            },
            StreamingEvent::ContentBlockDelta {
                index: 0,
                delta: crate::response::DeltaBlock::Text { text },
            },
            StreamingEvent::ContentBlockStop { index: 0 },
            StreamingEvent::MessageDelta {
                stop_reason: Some(FinishReason::Stop),
            },
            StreamingEvent::MessageStop {
                usage: Usage::default(),
            },
        ]])
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn context_window(&self, _model: &str) -> Option<u32> {
        Some(200_000)
    }

    async fn stream(&self, _request: Request) -> Result<EventStream, LLMError> {
        let mut turns = self.turns.lock().expect("mock provider mutex poisoned");
        let events = turns.pop_front().ok_or(LLMError::Transport {
            message: "mock provider has no more scripted turns".to_string(),
        })?;
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn replays_scripted_text_reply() {
        let provider = MockProvider::with_text_reply("hello");
        let mut events = provider
            .stream(Request::new("default", vec![]))
            .await
            .unwrap();
        let mut seen = Vec::new();
        while let Some(event) = events.next().await {
            seen.push(event.unwrap());
        }
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn errs_once_scripted_turns_are_exhausted() {
        let provider = MockProvider::with_scripted_turns(vec![]);
        let result = provider.stream(Request::new("default", vec![])).await;
        assert!(result.is_err());
    }
}
