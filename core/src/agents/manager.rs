use std::sync::Arc;

use forgelet_llm::{LLMProvider, Message, Request};

use crate::agents::base::parse_contracted;
use crate::engine::accumulate_stream;
use crate::error::Result;
use crate::task::TaskPlan;

const SYSTEM_PROMPT: &str = "You decompose a goal into an acyclic set of tasks. \
Each task has a short title, a longer description, the ids of tasks it depends \
on, and the file paths it will touch. Respond with a single JSON object \
matching {\"analysis\": \"...\", \"tasks\": [{\"id\": \"...\", \"title\": \"...\", \
\"description\": \"...\", \"dependencies\": [\"...\"], \"resources\": [\"...\"], \
\"priority\": 0}]}. Do not include prose outside the JSON.";

const REPLAN_SYSTEM_PROMPT: &str = "A reviewer has judged one of your tasks as needing a new \
plan rather than a simple fix. Given the original requirement, the task that failed, and the \
reviewer's comments, respond with a replacement plan in the same JSON shape as before: \
{\"analysis\": \"...\", \"tasks\": [{\"id\": \"...\", \"title\": \"...\", \"description\": \"...\", \
\"dependencies\": [\"...\"], \"resources\": [\"...\"], \"priority\": 0}]}. Do not include prose \
outside the JSON.";

/// C9 role agent: turns a goal description into a [`TaskPlan`]. Single
/// completion, no tool calls - the Manager only ever emits a plan.
#[derive(Clone)]
pub struct ManagerAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ManagerAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn plan(&self, requirement: &str) -> Result<TaskPlan> {
        let request = Request::new(&self.model, vec![Message::user(requirement)])
            .with_system_prompt(SYSTEM_PROMPT);
        let text = self.complete(request).await?;
        let (analysis, tasks) = self.parse_plan_response(&text)?;
        Ok(TaskPlan {
            id: uuid::Uuid::new_v4(),
            requirement: requirement.to_string(),
            analysis,
            tasks,
            creator_model: self.model.clone(),
            created_at: chrono::Utc::now(),
        })
    }

    /// Re-plans a requirement after a reviewer routed one of its tasks to
    /// `ReviewResult::Replan` (§4.10): the task itself was wrong, not just
    /// its execution, so the Manager is asked to produce a fresh plan rather
    /// than the Fixer patching the old one.
    pub async fn replan(&self, plan: &TaskPlan, task: &crate::task::Task, review: &crate::task::Review) -> Result<TaskPlan> {
        let prompt = format!(
            "Original requirement: {}\nFailed task: {}\nReviewer comments: {}",
            plan.requirement, task.description, review.comments
        );
        let request = Request::new(&self.model, vec![Message::user(prompt)])
            .with_system_prompt(REPLAN_SYSTEM_PROMPT);
        let text = self.complete(request).await?;
        let (analysis, tasks) = self.parse_plan_response(&text)?;
        Ok(TaskPlan {
            id: uuid::Uuid::new_v4(),
            requirement: plan.requirement.clone(),
            analysis,
            tasks,
            creator_model: self.model.clone(),
            created_at: chrono::Utc::now(),
        })
    }

    async fn complete(&self, request: Request) -> Result<String> {
        let stream = self.provider.stream(request).await?;
        let summary = accumulate_stream(stream).await?;
        Ok(summary
            .content
            .iter()
            .map(|block| match block {
                forgelet_llm::ContentBlock::Text { text } => text.as_str(),
                _ => "",
            })
            .collect::<String>())
    }

    fn parse_plan_response(&self, text: &str) -> Result<(String, Vec<crate::task::Task>)> {
        #[derive(serde::Deserialize)]
        struct RawTask {
            id: String,
            #[serde(default)]
            title: Option<String>,
            description: String,
            #[serde(default)]
            dependencies: Vec<String>,
            #[serde(default)]
            resources: Vec<std::path::PathBuf>,
            #[serde(default)]
            priority: i32,
        }
        #[derive(serde::Deserialize)]
        struct RawPlan {
            #[serde(default)]
            analysis: String,
            tasks: Vec<RawTask>,
        }

        let raw: RawPlan = parse_contracted(text)
            .map_err(|err| crate::error::OrchestratorError::InvalidGraph(err.to_string()))?;

        // Manager assigns its own string ids; translate those to UUIDs and
        // remap dependency references through a lookup table so the rest of
        // the system only ever sees `TaskId` (§3 invariant: tasks are keyed
        // by uuid, never by model-assigned string).
        let mut id_map = std::collections::HashMap::new();
        for raw_task in &raw.tasks {
            id_map.insert(raw_task.id.clone(), uuid::Uuid::new_v4());
        }

        let tasks = raw
            .tasks
            .into_iter()
            .map(|raw_task| {
                let dependencies = raw_task
                    .dependencies
                    .iter()
                    .filter_map(|dep| id_map.get(dep).copied())
                    .collect();
                let mut task = crate::task::Task::new(raw_task.description)
                    .with_dependencies(dependencies)
                    .with_resources(raw_task.resources)
                    .with_priority(raw_task.priority);
                task.id = id_map[&raw_task.id];
                if let Some(title) = raw_task.title {
                    task = task.with_title(title);
                }
                task
            })
            .collect();

        Ok((raw.analysis, tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgelet_llm::mock::MockProvider;

    #[tokio::test]
    async fn plan_remaps_string_ids_to_uuids_and_preserves_edges() {
        let reply = r#"{"tasks": [
            {"id": "a", "description": "write module", "dependencies": [], "resources": ["src/lib.rs"]},
            {"id": "b", "description": "write tests", "dependencies": ["a"], "resources": ["src/lib.rs"]}
        ]}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = ManagerAgent::new(provider, "default");
        let plan = agent.plan("build a thing").await.unwrap();

        assert_eq!(plan.tasks.len(), 2);
        let b = plan.tasks.iter().find(|t| t.description == "write tests").unwrap();
        let a = plan.tasks.iter().find(|t| t.description == "write module").unwrap();
        assert_eq!(b.dependencies, vec![a.id]);
        assert_eq!(plan.requirement, "build a thing");
    }

    #[tokio::test]
    async fn replan_carries_the_original_requirement_forward() {
        let reply = r#"{"analysis": "splitting into two tasks", "tasks": [
            {"id": "a", "title": "redo it", "description": "write module again", "dependencies": [], "resources": []}
        ]}"#;
        let provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(reply));
        let agent = ManagerAgent::new(provider, "default");
        let original = TaskPlan {
            requirement: "build a thing".to_string(),
            ..TaskPlan::default()
        };
        let task = crate::task::Task::new("write module");
        let review = crate::task::Review::from_issues(
            uuid::Uuid::new_v4(),
            task.id,
            "reviewer",
            10,
            "wrong approach entirely",
            vec![],
            false,
            None,
        );
        let replanned = agent.replan(&original, &task, &review).await.unwrap();
        assert_eq!(replanned.requirement, "build a thing");
        assert_eq!(replanned.analysis, "splitting into two tasks");
        assert_eq!(replanned.tasks[0].title, "redo it");
    }
}
