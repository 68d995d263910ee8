use std::sync::Arc;

use forgelet_llm::Message;

use crate::engine::ToolExecutionEngine;
use crate::error::Result;
use crate::task::{Execution, Task};

const SYSTEM_PROMPT: &str = "You are an executor working on a single task. Use the \
available tools to accomplish it, then reply with a short prose summary of what \
you did once the task is complete. Only touch the files listed as the task's \
resources.";

/// C9 role agent: drives a task to completion through the Tool Execution
/// Engine (C4), then folds the resulting transcript into an [`Execution`]
/// record for the Reviewer to judge.
#[derive(Clone)]
pub struct ExecutorAgent {
    engine: Arc<ToolExecutionEngine>,
    model: String,
}

impl ExecutorAgent {
    pub fn new(engine: Arc<ToolExecutionEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
        }
    }

    pub async fn execute(&self, task: &Task) -> Result<Execution> {
        let started_at = chrono::Utc::now();
        let prompt = format!(
            "Task: {}\nFiles you may touch: {:?}",
            task.description, task.resources
        );
        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let outcome = self.engine.run(&self.model, messages).await;

        let (outcome, error) = match outcome {
            Ok(outcome) => (outcome, None),
            Err(err) => (
                crate::engine::EngineOutcome {
                    messages: Vec::new(),
                    final_text: String::new(),
                    iterations: 0,
                    tool_usages: Vec::new(),
                    usage: forgelet_llm::Usage::default(),
                },
                Some(err.to_string()),
            ),
        };

        let mutated_files = outcome
            .tool_usages
            .iter()
            .filter(|usage| !usage.is_error)
            .filter_map(|usage| {
                usage
                    .arguments
                    .get("path")
                    .or_else(|| usage.arguments.get("file_path"))
                    .and_then(|v| v.as_str())
                    .map(std::path::PathBuf::from)
            })
            .filter(|path| task.resources.contains(path))
            .collect();

        Ok(Execution {
            id: uuid::Uuid::new_v4(),
            task_id: task.id,
            executor_id: "executor".to_string(),
            tool_usages: outcome.tool_usages,
            mutated_files,
            summary: outcome.final_text,
            success: error.is_none(),
            error,
            iterations: outcome.iterations,
            input_tokens: outcome.usage.input_tokens as u64,
            output_tokens: outcome.usage.output_tokens as u64,
            started_at,
            completed_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgelet_config::PermissionMode;
    use forgelet_llm::mock::MockProvider;
    use forgelet_llm::LLMProvider;
    use forgelet_tools::permissions::AutoDenyCallback;
    use forgelet_tools::{PermissionManager, ToolRegistry};

    fn bypass_permissions() -> Arc<PermissionManager> {
        let config = forgelet_config::PermissionsConfig {
            mode: PermissionMode::Bypass,
            audit_enabled: false,
            ..Default::default()
        };
        Arc::new(PermissionManager::new(&config, Box::new(AutoDenyCallback)).unwrap())
    }

    #[tokio::test]
    async fn execution_summary_is_the_final_reply() {
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("wrote the file"));
        let engine = Arc::new(crate::engine::ToolExecutionEngine::new(
            provider,
            ToolRegistry::new(),
            bypass_permissions(),
            3,
        ));
        let agent = ExecutorAgent::new(engine, "default");
        let task = Task::new("write a hello world file");
        let execution = agent.execute(&task).await.unwrap();
        assert_eq!(execution.summary, "wrote the file");
        assert_eq!(execution.iterations, 1);
        assert_eq!(execution.output_tokens, 0);
        assert!(execution.success);
        assert!(execution.error.is_none());
    }

    #[tokio::test]
    async fn exhausted_iterations_become_a_failed_execution_not_an_error() {
        let tool_use_turn = vec![
            forgelet_llm::StreamingEvent::MessageStart,
            forgelet_llm::StreamingEvent::ContentBlockStart {
                index: 0,
                block: forgelet_llm::ContentBlock::ToolUse {
                    id: "c1".to_string(),
                    name: "echo".to_string(),
                    input: serde_json::json!({"message": "hi"}),
                },
            },
            forgelet_llm::StreamingEvent::ContentBlockStop { index: 0 },
            forgelet_llm::StreamingEvent::MessageDelta { stop_reason: None },
            forgelet_llm::StreamingEvent::MessageStop {
                usage: Default::default(),
            },
        ];
        let provider: Arc<dyn LLMProvider> =
            Arc::new(MockProvider::with_scripted_turns(vec![tool_use_turn.clone(), tool_use_turn]));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(forgelet_tools::test_tools::EchoTool));
        let engine = Arc::new(crate::engine::ToolExecutionEngine::new(
            provider,
            registry,
            bypass_permissions(),
            2,
        ));
        let agent = ExecutorAgent::new(engine, "default");
        let task = Task::new("write a hello world file");
        let execution = agent.execute(&task).await.unwrap();
        assert!(!execution.success);
        assert!(execution.error.is_some());
    }
}
