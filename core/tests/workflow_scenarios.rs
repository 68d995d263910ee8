//! End-to-end scenario tests driving the full Workflow driver (C10) with
//! scripted `MockProvider` replies, no real model backend or tool bodies.

use std::sync::Arc;

use forgelet_config::{OrchestratorConfig, PermissionMode, PermissionsConfig};
use forgelet_core::agents::{EvaluatorAgent, ExecutorAgent, FixerAgent, ManagerAgent, ReviewerAgent};
use forgelet_core::{ToolExecutionEngine, WorkflowDriver};
use forgelet_llm::mock::MockProvider;
use forgelet_llm::LLMProvider;
use forgelet_tools::permissions::{AutoDenyCallback, PermissionManager};
use forgelet_tools::ToolRegistry;

fn bypass_permissions() -> Arc<PermissionManager> {
    let config = PermissionsConfig {
        mode: PermissionMode::Bypass,
        audit_enabled: false,
        ..PermissionsConfig::default()
    };
    Arc::new(PermissionManager::new(&config, Box::new(AutoDenyCallback)).unwrap())
}

fn deny_permissions() -> Arc<PermissionManager> {
    let config = PermissionsConfig {
        mode: PermissionMode::DontAsk,
        audit_enabled: false,
        ..PermissionsConfig::default()
    };
    Arc::new(PermissionManager::new(&config, Box::new(AutoDenyCallback)).unwrap())
}

fn single_task_plan_reply() -> &'static str {
    r#"{"tasks": [{"id": "t1", "description": "write a greeter", "dependencies": [], "resources": ["src/greeter.rs"]}]}"#
}

/// S4: the Executor's work fails review once; the Fixer's follow-up attempt
/// passes, and the task completes without exhausting `retry.max_retries`.
#[tokio::test]
async fn auto_fix_recovery_completes_the_task() {
    let manager_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(single_task_plan_reply()));
    let manager = ManagerAgent::new(manager_provider, "default");

    let executor_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("wrote the greeter"));
    let executor_engine = Arc::new(ToolExecutionEngine::new(
        executor_provider,
        ToolRegistry::new(),
        bypass_permissions(),
        10,
    ));
    let executor = ExecutorAgent::new(executor_engine, "default");

    let reviewer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_scripted_turns(vec![
        text_turn(
            r#"{"issues": [{"severity": "critical", "kind": "bug", "description": "missing greeting"}], "auto_fixable": true}"#,
        ),
        text_turn(r#"{"result": "pass", "issues": []}"#),
    ]));
    let reviewer = ReviewerAgent::new(reviewer_provider, "default");

    let fixer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("added the greeting"));
    let fixer_engine = Arc::new(ToolExecutionEngine::new(
        fixer_provider,
        ToolRegistry::new(),
        bypass_permissions(),
        10,
    ));
    let fixer = FixerAgent::new(fixer_engine, "default");

    let evaluator_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(
        r#"{"meets_requirement": true, "quality_score": 90, "strengths": [], "weaknesses": [], "suggestions": []}"#,
    ));
    let evaluator = EvaluatorAgent::new(evaluator_provider, "default");

    let config = OrchestratorConfig::default();
    let handles = WorkflowDriver::new(manager, executor, reviewer, fixer, evaluator, &config);
    let report = handles.driver.run("add a greeter module").await.unwrap();

    // The Fixer's corrected attempt is kept alongside the Executor's
    // original one - exactly two Executor-role invocations for this task.
    assert_eq!(report.executions.len(), 2);
    assert_eq!(report.reviews.len(), 2);
    assert!(report.reviews[1].passed());
    assert_eq!(report.executions[0].summary, "wrote the greeter");
    assert_eq!(report.executions[1].summary, "added the greeting");
    assert!(report.evaluation.is_some());
    assert_eq!(report.totals.completed, 1);
    assert_eq!(report.totals.retries, 1);
}

/// S5: a denying Permission Manager blocks every tool call the Executor
/// attempts; the task still produces an Execution (the denial surfaces as a
/// `ToolResult { is_error: true }`, never as a fatal `Err`), but the review
/// that follows judges it unacceptable and retries are exhausted.
#[tokio::test]
async fn permission_denial_is_not_fatal_but_fails_review() {
    let manager_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(single_task_plan_reply()));
    let manager = ManagerAgent::new(manager_provider, "default");

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
        forgelet_llm::StreamingEvent::MessageStop { usage: Default::default() },
    ];
    let executor_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_scripted_turns(vec![
        tool_use_turn,
        text_turn("gave up, the tool call was denied"),
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(forgelet_tools::test_tools::EchoTool));
    let executor_engine = Arc::new(ToolExecutionEngine::new(executor_provider, registry, deny_permissions(), 10));
    let executor = ExecutorAgent::new(executor_engine, "default");

    let reviewer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_scripted_turns(vec![
        text_turn(
            r#"{"issues": [{"severity": "critical", "kind": "bug", "description": "nothing was done"}], "auto_fixable": true}"#,
        ),
        text_turn(
            r#"{"issues": [{"severity": "critical", "kind": "bug", "description": "still nothing"}], "auto_fixable": true}"#,
        ),
    ]));
    let reviewer = ReviewerAgent::new(reviewer_provider, "default");

    let fixer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("still couldn't do it"));
    let fixer_engine = Arc::new(ToolExecutionEngine::new(fixer_provider, ToolRegistry::new(), deny_permissions(), 10));
    let fixer = FixerAgent::new(fixer_engine, "default");

    let evaluator_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(
        r#"{"meets_requirement": false, "quality_score": 20, "strengths": [], "weaknesses": ["permission denied"], "suggestions": ["grant file access"]}"#,
    ));
    let evaluator = EvaluatorAgent::new(evaluator_provider, "default");

    let mut config = OrchestratorConfig::default();
    config.retry.max_retries = 1;
    let handles = WorkflowDriver::new(manager, executor, reviewer, fixer, evaluator, &config);
    let report = handles.driver.run("add a greeter module").await.unwrap();

    // The task never clears review, so `run_task_with_retries` returns the
    // failure branch: both attempted Executions are kept for the report,
    // but no passing Review is ever recorded for it.
    assert_eq!(report.executions.len(), 2);
    assert_eq!(report.reviews.len(), 2);
    assert!(!report.reviews.iter().any(|r| r.passed()));
    assert_eq!(report.executions[1].summary, "still couldn't do it");
    assert_eq!(report.totals.failed, 1);
}

/// Cancelling the driver's token mid-run stops the scheduling loop instead
/// of completing the plan.
#[tokio::test]
async fn cancellation_token_stops_the_run() {
    let manager_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(single_task_plan_reply()));
    let manager = ManagerAgent::new(manager_provider, "default");

    let executor_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("wrote the greeter"));
    let executor_engine = Arc::new(ToolExecutionEngine::new(executor_provider, ToolRegistry::new(), bypass_permissions(), 10));
    let executor = ExecutorAgent::new(executor_engine, "default");

    let reviewer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(r#"{"issues": []}"#));
    let reviewer = ReviewerAgent::new(reviewer_provider, "default");

    let fixer_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply("n/a"));
    let fixer_engine = Arc::new(ToolExecutionEngine::new(fixer_provider, ToolRegistry::new(), bypass_permissions(), 10));
    let fixer = FixerAgent::new(fixer_engine, "default");

    let evaluator_provider: Arc<dyn LLMProvider> = Arc::new(MockProvider::with_text_reply(r#"{"summary": "n/a", "recommendations": []}"#));
    let evaluator = EvaluatorAgent::new(evaluator_provider, "default");

    let config = OrchestratorConfig::default();
    let handles = WorkflowDriver::new(manager, executor, reviewer, fixer, evaluator, &config);
    handles.driver.cancellation_token().cancel();

    let result = handles.driver.run("add a greeter module").await;
    assert!(matches!(result, Err(forgelet_core::OrchestratorError::Cancelled)));
}

fn text_turn(text: impl Into<String>) -> Vec<forgelet_llm::StreamingEvent> {
    let text = text.into();
    vec![
        forgelet_llm::StreamingEvent::MessageStart,
        forgelet_llm::StreamingEvent::ContentBlockStart {
            index: 0,
            block: forgelet_llm::ContentBlock::Text { text: String::new() },
        },
        forgelet_llm::StreamingEvent::ContentBlockDelta {
            index: 0,
            delta: forgelet_llm::DeltaBlock::Text { text },
        },
        forgelet_llm::StreamingEvent::ContentBlockStop { index: 0 },
        forgelet_llm::StreamingEvent::MessageDelta { stop_reason: Some(forgelet_llm::FinishReason::Stop) },
        forgelet_llm::StreamingEvent::MessageStop { usage: Default::default() },
    ]
}
