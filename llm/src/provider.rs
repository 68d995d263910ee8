use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::request::Request;
use crate::response::StreamingEvent;

/// Transport-level failure talking to a model backend. Everything here is
/// fatal to the current turn - tool-execution failures are represented
/// separately as `ToolResult { is_error: true }` values, never as an
/// `LLMError`.
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimit { retry_after_secs: Option<u64> },

    #[error("request rejected by provider: {message}")]
    InvalidRequest { message: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("provider returned an unparseable stream event: {message}")]
    MalformedStream { message: String },
}

impl From<&LLMError> for forgelet_commons::ErrorCategory {
    fn from(err: &LLMError) -> Self {
        use forgelet_commons::ErrorCategory;
        match err {
            LLMError::Authentication { .. } => ErrorCategory::Authentication,
            LLMError::RateLimit { .. } => ErrorCategory::RateLimit,
            LLMError::InvalidRequest { .. } => ErrorCategory::InvalidParameters,
            LLMError::Transport { message } => {
                forgelet_commons::error_category::classify_error_message(message)
            }
            LLMError::MalformedStream { .. } => ErrorCategory::InvalidParameters,
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamingEvent, LLMError>> + Send>>;

/// The C1 provider contract. Concrete backends (Anthropic, OpenAI, local
/// model servers, ...) are explicitly out of scope here - this trait is the
/// entire surface the rest of the system depends on.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    fn name(&self) -> &str;

    fn supports_tools(&self) -> bool {
        true
    }

    /// Effective context window in tokens for the given model identifier, if
    /// known.
    fn context_window(&self, model: &str) -> Option<u32>;

    /// Stream a completion. Implementations normalize their backend's wire
    /// protocol into the `StreamingEvent` sum type as events arrive.
    async fn stream(&self, request: Request) -> Result<EventStream, LLMError>;
}
