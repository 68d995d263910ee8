use std::sync::Arc;

use forgelet_llm::Message;

use crate::engine::ToolExecutionEngine;
use crate::error::Result;
use crate::task::{Execution, Review, Task};

const SYSTEM_PROMPT: &str = "You are fixing a task that failed review. Use the available \
tools to address every issue raised, then reply with a short prose summary of the \
fix once you are done. Only touch the files listed as the task's resources.";

/// C9 role agent: re-runs a failed task through the engine with the
/// Reviewer's issues folded into the prompt, producing a fresh [`Execution`]
/// for re-review.
#[derive(Clone)]
pub struct FixerAgent {
    engine: Arc<ToolExecutionEngine>,
    model: String,
}

impl FixerAgent {
    pub fn new(engine: Arc<ToolExecutionEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
        }
    }

    pub async fn fix(&self, task: &Task, previous: &Execution, review: &Review) -> Result<Execution> {
        let started_at = chrono::Utc::now();
        let issues = review
            .issues
            .iter()
            .map(|issue| format!("- [{:?}] {}", issue.severity, issue.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Task: {}\nPrevious attempt summary: {}\nReview issues:\n{}\nFix suggestion: {}\nFiles you may touch: {:?}",
            task.description,
            previous.summary,
            issues,
            review.fix_suggestion.as_deref().unwrap_or("none given"),
            task.resources
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

        let mut mutated_files = previous.mutated_files.clone();
        for usage in &outcome.tool_usages {
            if usage.is_error {
                continue;
            }
            if let Some(path) = usage
                .arguments
                .get("path")
                .or_else(|| usage.arguments.get("file_path"))
                .and_then(|v| v.as_str())
            {
                let path = std::path::PathBuf::from(path);
                if task.resources.contains(&path) && !mutated_files.contains(&path) {
                    mutated_files.push(path);
                }
            }
        }

        Ok(Execution {
            id: uuid::Uuid::new_v4(),
            task_id: task.id,
            executor_id: "fixer".to_string(),
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
    use crate::task::{IssueKind, IssueSeverity, ReviewIssue};

    fn bypass_permissions() -> Arc<PermissionManager> {
        let config = forgelet_config::PermissionsConfig {
            mode: PermissionMode::Bypass,
            audit_enabled: false,
            ..Default::default()
        };
        Arc::new(PermissionManager::new(&config, Box::new(AutoDenyCallback)).unwrap())
    }

    #[tokio::test]
    async fn fix_produces_a_new_execution_for_the_same_task() {
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("fixed it"));
        let engine = Arc::new(ToolExecutionEngine::new(
            provider,
            ToolRegistry::new(),
            bypass_permissions(),
            3,
        ));
        let agent = FixerAgent::new(engine, "default");
        let task = Task::new("write a hello world file");
        let now = chrono::Utc::now();
        let previous = Execution {
            id: uuid::Uuid::new_v4(),
            task_id: task.id,
            executor_id: "executor".to_string(),
            tool_usages: vec![],
            mutated_files: vec![],
            summary: "broken attempt".to_string(),
            success: false,
            error: Some("missing file".to_string()),
            iterations: 1,
            input_tokens: 0,
            output_tokens: 0,
            started_at: now,
            completed_at: now,
        };
        let review = Review::from_issues(
            previous.id,
            task.id,
            "reviewer",
            30,
            "missing the output file",
            vec![ReviewIssue {
                severity: IssueSeverity::Critical,
                kind: IssueKind::Bug,
                description: "missing file".to_string(),
                location: None,
                suggestion: Some("create the file".to_string()),
            }],
            true,
            Some("create the file".to_string()),
        );
        let fixed = agent.fix(&task, &previous, &review).await.unwrap();
        assert_eq!(fixed.task_id, task.id);
        assert_eq!(fixed.summary, "fixed it");
        assert_ne!(fixed.id, previous.id);
        assert!(fixed.success);
    }
}
