use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use forgelet_llm::{
    CompletionSummary, ContentBlock, DeltaBlock, LLMProvider, Message, Request, StreamingEvent,
    ToolCall, apply_delta,
};
use forgelet_tools::{
    HookConfig, HookRunner, PermissionManager, ProcessHookRunner, RuleAction, ToolCallHistory,
    ToolExecutionContext, ToolRegistry, run_pre_tool_use_hooks,
};
use futures::StreamExt;

use crate::error::{OrchestratorError, Result};
use crate::task::ToolUsage;

/// Drives one provider stream to completion, folding `ContentBlockStart`/
/// `ContentBlockDelta`/`ContentBlockStop` events into a `Vec<ContentBlock>`
/// by index (testable property: streaming round-trip).
pub async fn accumulate_stream(
    mut stream: forgelet_llm::EventStream,
) -> std::result::Result<CompletionSummary, forgelet_llm::LLMError> {
    let mut summary = CompletionSummary::default();
    let mut blocks: Vec<Option<ContentBlock>> = Vec::new();

    while let Some(event) = stream.next().await {
        match event? {
            StreamingEvent::MessageStart => {}
            StreamingEvent::ContentBlockStart { index, block } => {
                if blocks.len() <= index {
                    blocks.resize(index + 1, None);
                }
                blocks[index] = Some(block);
            }
            StreamingEvent::ContentBlockDelta { index, delta } => {
                if let Some(Some(block)) = blocks.get_mut(index) {
                    apply_block_delta(block, &delta);
                }
            }
            StreamingEvent::ContentBlockStop { .. } => {}
            StreamingEvent::MessageDelta { stop_reason } => {
                summary.finish_reason = stop_reason;
            }
            StreamingEvent::MessageStop { usage } => {
                summary.usage = usage;
            }
        }
    }

    summary.content = blocks.into_iter().flatten().collect();
    Ok(summary)
}

fn apply_block_delta(block: &mut ContentBlock, delta: &DeltaBlock) {
    apply_delta(block, delta);
}

fn extract_tool_calls(content: &[ContentBlock]) -> Vec<ToolCall> {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                id: id.clone(),
                name: name.clone(),
                arguments: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Extracts the subject a permission rule matches on: the `path`/`file_path`
/// argument if present, otherwise the `command`'s first word, otherwise the
/// whole serialized arguments.
fn permission_subject(call: &ToolCall) -> String {
    if let Some(path) = call
        .arguments
        .get("path")
        .or_else(|| call.arguments.get("file_path"))
        .and_then(|v| v.as_str())
    {
        return path.to_string();
    }
    if let Some(command) = call.arguments.get("command").and_then(|v| v.as_str()) {
        return command.to_string();
    }
    call.arguments.to_string()
}

/// Outcome of running the Tool Execution Engine (C4) to completion: the full
/// message transcript for this turn sequence plus the final assistant text.
pub struct EngineOutcome {
    pub messages: Vec<Message>,
    pub final_text: String,
    pub iterations: u32,
    pub tool_usages: Vec<ToolUsage>,
    pub usage: forgelet_llm::Usage,
}

/// C4: the turn loop shared by every role agent that can call tools
/// (Executor, Fixer). Role agents that only emit a single JSON-contracted
/// response (Manager, Reviewer, Evaluator) call `accumulate_stream`
/// directly instead.
pub struct ToolExecutionEngine {
    provider: Arc<dyn LLMProvider>,
    registry: ToolRegistry,
    permissions: Arc<PermissionManager>,
    max_iterations: u32,
    session_id: String,
    working_directory: PathBuf,
    project_root: PathBuf,
    hook_config: HookConfig,
    hook_runner: Arc<dyn HookRunner>,
}

impl ToolExecutionEngine {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        registry: ToolRegistry,
        permissions: Arc<PermissionManager>,
        max_iterations: u32,
    ) -> Self {
        Self {
            provider,
            registry,
            permissions,
            max_iterations,
            session_id: uuid::Uuid::new_v4().to_string(),
            working_directory: PathBuf::from("."),
            project_root: PathBuf::from("."),
            hook_config: HookConfig::default(),
            hook_runner: Arc::new(ProcessHookRunner),
        }
    }

    /// Scopes the per-call [`ToolExecutionContext`] this engine builds to a
    /// concrete session and pair of directories instead of the defaults.
    pub fn with_session(mut self, session_id: impl Into<String>, working_directory: PathBuf, project_root: PathBuf) -> Self {
        self.session_id = session_id.into();
        self.working_directory = working_directory;
        self.project_root = project_root;
        self
    }

    /// Installs a `PreToolUse`/`PostToolUse` hook configuration and the
    /// runner used to execute its commands. Without this, the engine runs
    /// with an empty hook config, so no hook ever fires.
    pub fn with_hooks(mut self, hook_config: HookConfig, hook_runner: Arc<dyn HookRunner>) -> Self {
        self.hook_config = hook_config;
        self.hook_runner = hook_runner;
        self
    }

    fn build_context(&self) -> ToolExecutionContext {
        let permissions = Arc::clone(&self.permissions);
        ToolExecutionContext::new(
            self.session_id.clone(),
            self.working_directory.clone(),
            self.project_root.clone(),
            self.permissions.mode(),
            Arc::new(move |tool_name, subject| permissions.evaluate(tool_name, subject)),
            Arc::new(|text| tracing::info!(%text, "tool output")),
        )
    }

    /// Runs the matching `PreToolUse` hooks for `call`, returning `Some` with
    /// an error result when a hook vetoes the call or the hook subprocess
    /// itself could not be spawned - either way the underlying tool never
    /// runs and the Permission Manager's audit log never sees this call.
    async fn evaluate_hooks(
        &self,
        call: &ToolCall,
        subject: &str,
        env: &HashMap<String, String>,
    ) -> Option<forgelet_tools::ToolResult> {
        match run_pre_tool_use_hooks(&self.hook_config, self.hook_runner.as_ref(), &call.name, subject, env).await {
            Ok(Some(message)) => Some(forgelet_tools::ToolResult {
                content: format!("blocked by hook: {message}"),
                is_error: true,
            }),
            Ok(None) => None,
            Err(err) => Some(forgelet_tools::ToolResult {
                content: format!("hook execution failed: {err}"),
                is_error: true,
            }),
        }
    }

    pub async fn run(&self, model: &str, mut messages: Vec<Message>) -> Result<EngineOutcome> {
        let ctx = self.build_context();
        let mut history = ToolCallHistory::new();
        let mut tool_usages = Vec::new();
        let mut usage = forgelet_llm::Usage::default();
        let tools = self.registry.to_api_tools();
        let hook_env: HashMap<String, String> = std::env::vars().collect();

        for iteration in 1..=self.max_iterations {
            let request = Request::new(model, messages.clone()).with_tools(tools.clone());
            let stream = self.provider.stream(request).await?;
            let summary = accumulate_stream(stream).await?;
            usage.input_tokens += summary.usage.input_tokens;
            usage.output_tokens += summary.usage.output_tokens;
            usage.cache_read_tokens += summary.usage.cache_read_tokens;
            usage.cache_write_tokens += summary.usage.cache_write_tokens;

            let text = summary
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("");

            let tool_calls = extract_tool_calls(&summary.content);
            if tool_calls.is_empty() {
                messages.push(Message::assistant(text.clone()));
                return Ok(EngineOutcome {
                    messages,
                    final_text: text,
                    iterations: iteration,
                    tool_usages,
                    usage,
                });
            }

            messages.push(Message::assistant_with_tools(
                if text.is_empty() { None } else { Some(text.clone()) },
                tool_calls.clone(),
            ));

            for call in &tool_calls {
                let subject = permission_subject(call);
                let start = std::time::Instant::now();

                let result = if let Some(violation) = self
                    .registry
                    .get(&call.name)
                    .and_then(|tool| tool.validate(&call.arguments))
                {
                    forgelet_tools::ToolResult {
                        content: format!("validation failed for tool {}: {violation}", call.name),
                        is_error: true,
                    }
                } else if let Some(outcome) = self.evaluate_hooks(call, &subject, &hook_env).await {
                    outcome
                } else {
                    let decision = self.permissions.evaluate(&call.name, &subject);
                    match decision {
                        RuleAction::Deny => forgelet_tools::ToolResult {
                            content: format!("permission denied for tool {}", call.name),
                            is_error: true,
                        },
                        RuleAction::Allow | RuleAction::Ask => match self.registry.get(&call.name) {
                            Some(tool) => tool.execute(&ctx, call.arguments.clone()).await,
                            None => forgelet_tools::ToolResult {
                                content: format!("unknown tool {}", call.name),
                                is_error: true,
                            },
                        },
                    }
                };

                history.record(call.name.clone(), call.arguments.clone(), &result);
                tool_usages.push(ToolUsage {
                    tool_name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result_summary: result.content.clone(),
                    is_error: result.is_error,
                    duration_ms: start.elapsed().as_millis() as u64,
                });
                messages.push(Message::tool_result(call.id.clone(), result.content, result.is_error));
            }
        }

        Err(OrchestratorError::IterationBudgetExhausted {
            task_id: "unknown".to_string(),
            limit: self.max_iterations,
        })
    }
}
