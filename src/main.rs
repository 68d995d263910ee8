//! `forgelet` CLI: loads an orchestrator configuration, wires a workflow
//! run together, and prints the resulting report as JSON. Concrete LLM
//! providers are outside this crate's scope - bring your own
//! `forgelet_llm::LLMProvider` by building a custom binary against this
//! crate's library surface, or swap the `provider` module below for one.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use forgelet_config::ConfigLoader;
use forgelet_core::agents::{EvaluatorAgent, ExecutorAgent, FixerAgent, ManagerAgent, ReviewerAgent};
use forgelet_core::{ToolExecutionEngine, WorkflowDriver};
use forgelet_llm::LLMProvider;
use forgelet_tools::permissions::AutoDenyCallback;
use forgelet_tools::{PermissionManager, ToolRegistry};

#[derive(Parser)]
#[command(name = "forgelet", about = "A multi-agent coding orchestrator")]
struct Cli {
    /// Natural-language description of the change to plan, execute, review,
    /// fix, and evaluate.
    goal: String,

    /// Workspace root to load `.forgelet/config.toml` from.
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = ConfigLoader::load(&cli.workspace).context("loading orchestrator configuration")?;
    let provider = build_provider()?;
    let registry = ToolRegistry::new();
    let permissions = Arc::new(
        PermissionManager::new(&config.permissions, Box::new(AutoDenyCallback))
            .context("constructing permission manager")?,
    );

    let manager = ManagerAgent::new(
        provider.clone(),
        forgelet_core::workflow::resolve_model(&config, "manager"),
    );
    let executor_engine = Arc::new(ToolExecutionEngine::new(
        provider.clone(),
        registry.clone(),
        permissions.clone(),
        config.retry.executor_iterations,
    ));
    let fixer_engine = Arc::new(ToolExecutionEngine::new(
        provider.clone(),
        registry.clone(),
        permissions.clone(),
        config.retry.fixer_iterations,
    ));
    let executor = ExecutorAgent::new(executor_engine, forgelet_core::workflow::resolve_model(&config, "executor"));
    let reviewer = ReviewerAgent::new(provider.clone(), forgelet_core::workflow::resolve_model(&config, "reviewer"));
    let fixer = FixerAgent::new(fixer_engine, forgelet_core::workflow::resolve_model(&config, "fixer"));
    let evaluator = EvaluatorAgent::new(provider, forgelet_core::workflow::resolve_model(&config, "evaluator"));

    let handles = WorkflowDriver::new(manager, executor, reviewer, fixer, evaluator, &config);
    let report = handles.driver.run(&cli.goal).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// No concrete LLM backend ships with this crate - only the provider
/// contract (`forgelet_llm::LLMProvider`) does. A real deployment links a
/// concrete provider here instead of failing at startup.
fn build_provider() -> Result<Arc<dyn LLMProvider>> {
    anyhow::bail!(
        "no LLMProvider implementation is linked into this binary; \
         implement forgelet_llm::LLMProvider for your backend of choice and wire it in here"
    )
}
