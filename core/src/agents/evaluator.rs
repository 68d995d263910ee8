use std::sync::Arc;

use forgelet_llm::{ContentBlock, LLMProvider, Message, Request};

use crate::agents::base::parse_contracted;
use crate::engine::accumulate_stream;
use crate::error::Result;
use crate::task::{Evaluation, Execution, Review, TaskPlan};

const SYSTEM_PROMPT: &str = "You evaluate a completed workflow run as a whole, given its \
task plan, executions, and reviews. Respond with a single JSON object matching \
{\"meets_requirement\": true|false, \"quality_score\": 0-100, \"strengths\": [\"...\"], \
\"weaknesses\": [\"...\"], \"suggestions\": [\"...\"]}. Do not include prose outside the JSON.";

/// C9 role agent: the final pass over a whole completed plan, producing the
/// narrative [`Evaluation`] that closes out the [`crate::task::FinalReport`].
#[derive(Clone)]
pub struct EvaluatorAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl EvaluatorAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn evaluate(
        &self,
        plan: &TaskPlan,
        executions: &[Execution],
        reviews: &[Review],
    ) -> Result<Evaluation> {
        let prompt = format!(
            "Plan had {} tasks. {} executions completed. {} reviews passed out of {}.",
            plan.tasks.len(),
            executions.len(),
            reviews.iter().filter(|r| r.passed()).count(),
            reviews.len(),
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
        struct RawEvaluation {
            #[serde(default)]
            meets_requirement: bool,
            #[serde(default)]
            quality_score: u8,
            #[serde(default)]
            strengths: Vec<String>,
            #[serde(default)]
            weaknesses: Vec<String>,
            #[serde(default)]
            suggestions: Vec<String>,
        }
        let raw: RawEvaluation = parse_contracted(&text)
            .map_err(|err| crate::error::OrchestratorError::InvalidGraph(err.to_string()))?;

        Ok(Evaluation {
            plan_id: plan.id,
            meets_requirement: raw.meets_requirement,
            quality_score: raw.quality_score,
            strengths: raw.strengths,
            weaknesses: raw.weaknesses,
            suggestions: raw.suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgelet_llm::mock::MockProvider;

    #[tokio::test]
    async fn parses_quality_fields() {
        let reply = r#"{"meets_requirement": true, "quality_score": 88, "strengths": ["clean diff"], "weaknesses": [], "suggestions": ["add more tests"]}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = EvaluatorAgent::new(provider, "default");
        let plan = TaskPlan::default();
        let evaluation = agent.evaluate(&plan, &[], &[]).await.unwrap();
        assert!(evaluation.meets_requirement);
        assert_eq!(evaluation.quality_score, 88);
        assert_eq!(evaluation.plan_id, plan.id);
        assert_eq!(evaluation.suggestions, vec!["add more tests".to_string()]);
    }
}
