use thiserror::Error;

/// Top-level orchestrator failure taxonomy (§7). Permission-denied and
/// tool-execution failures are deliberately absent: those are represented
/// as `ToolResult { is_error: true, .. }` values and never surface as an
/// `Err` here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Configuration(#[from] forgelet_config::ConfigError),

    #[error("provider transport error: {0}")]
    Provider(#[from] forgelet_llm::LLMError),

    #[error("task {task_id} exhausted its iteration budget ({limit} turns)")]
    IterationBudgetExhausted { task_id: String, limit: u32 },

    #[error("task {task_id} exhausted its retry budget ({max_retries} attempts) during review")]
    ReviewRetryExhausted { task_id: String, max_retries: u32 },

    #[error("workflow run was cancelled")]
    Cancelled,

    #[error("task graph is invalid: {0}")]
    InvalidGraph(String),
}

impl OrchestratorError {
    /// Classifies the failure so a caller can decide whether retrying the
    /// whole workflow run is worthwhile.
    pub fn category(&self) -> forgelet_commons::ErrorCategory {
        use forgelet_commons::ErrorCategory;
        match self {
            OrchestratorError::Configuration(_) => ErrorCategory::InvalidParameters,
            OrchestratorError::Provider(err) => err.into(),
            OrchestratorError::IterationBudgetExhausted { .. } => ErrorCategory::ResourceExhausted,
            OrchestratorError::ReviewRetryExhausted { .. } => ErrorCategory::ResourceExhausted,
            OrchestratorError::Cancelled => ErrorCategory::Cancelled,
            OrchestratorError::InvalidGraph(_) => ErrorCategory::InvalidParameters,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_delegate_to_llm_categorization() {
        let err = OrchestratorError::Provider(forgelet_llm::LLMError::RateLimit {
            retry_after_secs: None,
        });
        assert_eq!(err.category(), forgelet_commons::ErrorCategory::RateLimit);
    }

    #[test]
    fn budget_exhaustion_is_resource_exhausted() {
        let err = OrchestratorError::IterationBudgetExhausted {
            task_id: "t1".to_string(),
            limit: 10,
        };
        assert_eq!(err.category(), forgelet_commons::ErrorCategory::ResourceExhausted);
    }
}
