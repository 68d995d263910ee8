use std::sync::Arc;

use forgelet_llm::{ContentBlock, LLMProvider, Message, Request};

use crate::agents::base::parse_contracted;
use crate::engine::accumulate_stream;
use crate::error::Result;
use crate::task::{Execution, Review, Task};

const SYSTEM_PROMPT: &str = "You review a completed task's execution summary and tool \
usages against its description. Respond with a single JSON object matching \
{\"result\": \"pass\"|\"fail\"|\"replan\", \"score\": 0-100, \"comments\": \"...\", \
\"auto_fixable\": true|false, \"fix_suggestion\": \"...\"|null, \"issues\": \
[{\"severity\": \"minor\"|\"major\"|\"critical\", \"kind\": \"bug\"|\"security\"|\"style\"|\"performance\", \
\"description\": \"...\", \"location\": \"...\"|null, \"suggestion\": \"...\"|null}]}. Use \"replan\" \
only when the task's approach itself is wrong, not just its execution. An empty issues array with \
result \"pass\" means the work is acceptable. Do not include prose outside the JSON.";

/// C9 role agent: judges an [`Execution`] against its [`Task`], producing a
/// [`Review`]. The model states `result` explicitly so it can route a task
/// to `Replan` instead of the ordinary fix loop.
#[derive(Clone)]
pub struct ReviewerAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ReviewerAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn review(&self, task: &Task, execution: &Execution) -> Result<Review> {
        let prompt = format!(
            "Task: {}\nSummary: {}\nTool usages: {}\nMutated files: {:?}",
            task.description,
            execution.summary,
            serde_json::to_string(&execution.tool_usages).unwrap_or_default(),
            execution.mutated_files,
        );
        let request = Request::new(&self.model, vec![Message::user(prompt)])
            .with_system_prompt(SYSTEM_PROMPT);
        let stream = self.provider.stream(request).await?;
        let summary = accumulate_stream(stream).await?;
        let text = summary
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
                _ => "",
            })
            .collect::<String>();

        #[derive(serde::Deserialize)]
        struct RawReview {
            #[serde(default)]
            result: Option<crate::task::ReviewResult>,
            #[serde(default)]
            score: u8,
            #[serde(default)]
            comments: String,
            #[serde(default)]
            auto_fixable: bool,
            #[serde(default)]
            fix_suggestion: Option<String>,
            #[serde(default)]
            issues: Vec<crate::task::ReviewIssue>,
        }
        let raw: RawReview = parse_contracted(&text)
            .map_err(|err| crate::error::OrchestratorError::InvalidGraph(err.to_string()))?;

        let mut review = Review::from_issues(
            execution.id,
            task.id,
            "reviewer",
            raw.score,
            raw.comments,
            raw.issues,
            raw.auto_fixable,
            raw.fix_suggestion,
        );
        // The model's own `result` overrides the severity-derived default
        // only to promote to `Replan` - it never downgrades a blocking
        // review back to `Pass`.
        if raw.result == Some(crate::task::ReviewResult::Replan) {
            review.result = crate::task::ReviewResult::Replan;
        }
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgelet_llm::mock::MockProvider;

    fn execution_for(task_id: crate::task::TaskId) -> Execution {
        let now = chrono::Utc::now();
        Execution {
            id: uuid::Uuid::new_v4(),
            task_id,
            executor_id: "executor".to_string(),
            tool_usages: vec![],
            mutated_files: vec![],
            summary: "done".to_string(),
            success: true,
            error: None,
            iterations: 1,
            input_tokens: 0,
            output_tokens: 0,
            started_at: now,
            completed_at: now,
        }
    }

    #[tokio::test]
    async fn no_issues_means_passing() {
        let reply = r#"{"result": "pass", "score": 95, "comments": "looks good", "issues": []}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = ReviewerAgent::new(provider, "default");
        let task = crate::task::Task::new("write module");
        let execution = execution_for(task.id);
        let review = agent.review(&task, &execution).await.unwrap();
        assert!(review.passed());
    }

    #[tokio::test]
    async fn critical_issue_fails_review() {
        let reply = r#"{"issues": [{"severity": "critical", "kind": "bug", "description": "build is broken"}]}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = ReviewerAgent::new(provider, "default");
        let task = crate::task::Task::new("write module");
        let execution = execution_for(task.id);
        let review = agent.review(&task, &execution).await.unwrap();
        assert!(!review.passed());
        assert_eq!(review.issues.len(), 1);
    }

    #[tokio::test]
    async fn explicit_replan_result_overrides_issue_derived_pass() {
        let reply = r#"{"result": "replan", "score": 15, "comments": "wrong approach", "issues": []}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = ReviewerAgent::new(provider, "default");
        let task = crate::task::Task::new("write module");
        let execution = execution_for(task.id);
        let review = agent.review(&task, &execution).await.unwrap();
        assert_eq!(review.result, crate::task::ReviewResult::Replan);
        assert!(!review.can_auto_fix());
    }
}
