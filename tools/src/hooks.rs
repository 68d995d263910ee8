use std::collections::HashMap;

use async_trait::async_trait;
use forgelet_commons::sanitizer::redact_secrets;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Environment variable name fragments that are stripped before a hook
/// subprocess is spawned (§6), so a `PreToolUse`/`PostToolUse` hook script
/// cannot read provider API keys out of the orchestrator's own environment.
const SENSITIVE_FRAGMENTS: &[&str] = &["API_KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL"];

pub fn strip_sensitive_env(env: &HashMap<String, String>) -> HashMap<String, String> {
    env.iter()
        .filter(|(key, _)| {
            let upper = key.to_ascii_uppercase();
            !SENSITIVE_FRAGMENTS.iter().any(|fragment| upper.contains(fragment))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Outcome of running a hook: exit code plus stdout, used by the Permission
/// Manager to decide whether a `PreToolUse` hook vetoed the call (S6).
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub exit_code: i32,
    pub stdout: String,
}

impl HookOutcome {
    pub fn vetoed(&self) -> bool {
        self.exit_code == 2
    }
}

/// Abstraction over hook subprocess execution so the engine and permission
/// manager can be tested without spawning real processes.
#[async_trait]
pub trait HookRunner: Send + Sync {
    async fn run(&self, command: &str, env: &HashMap<String, String>) -> std::io::Result<HookOutcome>;
}

pub struct ProcessHookRunner;

#[async_trait]
impl HookRunner for ProcessHookRunner {
    async fn run(&self, command: &str, env: &HashMap<String, String>) -> std::io::Result<HookOutcome> {
        let sanitized_env = strip_sensitive_env(env);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env_clear()
            .envs(sanitized_env)
            .output()
            .await?;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = redact_secrets(String::from_utf8_lossy(&output.stdout).into_owned());
        tracing::debug!(command, exit_code, stdout = %stdout, "hook subprocess finished");
        Ok(HookOutcome { exit_code, stdout })
    }
}

/// Recognized hook lifecycle events (§6). The Tool Execution Engine only
/// ever fires `PreToolUse`/`PostToolUse`; the rest are surfaced for a CLI
/// host to wire up around session/compaction boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    Stop,
    SubagentStop,
    SessionStart,
    SessionEnd,
    UserPromptSubmit,
    PreCompact,
    Notification,
}

/// What a [`HookDefinition`] fires on: an event, optionally narrowed to a
/// tool name, file path glob, or command glob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookMatcher {
    pub event: HookEvent,
    #[serde(default, rename = "toolName")]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

impl HookMatcher {
    /// True if this matcher fires for a `PreToolUse` call to `tool_name`
    /// with the given `subject` (file path or shell command).
    pub fn matches_tool_call(&self, event: HookEvent, tool_name: &str, subject: &str) -> bool {
        if self.event != event {
            return false;
        }
        if let Some(expected) = &self.tool_name {
            if expected != tool_name {
                return false;
            }
        }
        if let Some(pattern) = &self.path {
            if !crate::permissions::rules::glob_to_regex(pattern)
                .map(|re| re.is_match(subject))
                .unwrap_or(false)
            {
                return false;
            }
        }
        if let Some(pattern) = &self.command {
            if !crate::permissions::rules::glob_to_regex(pattern)
                .map(|re| re.is_match(subject))
                .unwrap_or(false)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Command,
    Prompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookAction {
    #[serde(rename = "type")]
    pub kind: HookType,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookDefinition {
    pub matcher: HookMatcher,
    pub hooks: Vec<HookAction>,
}

/// A parsed hook-configuration file (§6): an ordered list of matcher ->
/// action-list entries. Accepts either JSON or YAML source text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

#[derive(Debug, thiserror::Error)]
pub enum HookConfigError {
    #[error("failed to parse hook configuration: {0}")]
    Parse(String),
}

impl HookConfig {
    /// Parses a hook-configuration file, trying JSON first (the common
    /// case for tool-generated configs) and falling back to YAML.
    pub fn parse(source: &str) -> Result<Self, HookConfigError> {
        if let Ok(config) = serde_json::from_str::<Self>(source) {
            return Ok(config);
        }
        serde_saphyr::from_str(source).map_err(|err| HookConfigError::Parse(err.to_string()))
    }

    /// Every `Command` hook whose matcher fires for a `PreToolUse` call to
    /// `tool_name` with `subject`, in file order.
    pub fn matching_pre_tool_use(&self, tool_name: &str, subject: &str) -> Vec<&HookAction> {
        self.hooks
            .iter()
            .filter(|def| def.matcher.matches_tool_call(HookEvent::PreToolUse, tool_name, subject))
            .flat_map(|def| def.hooks.iter())
            .filter(|hook| hook.kind == HookType::Command)
            .collect()
    }
}

/// Runs every matching `PreToolUse` hook in order via `runner`; the first
/// one whose exit status is 2 vetoes the call (§6). Returns `Some(message)`
/// with the vetoing hook's combined output if any hook blocks, `None` if
/// every hook allowed the call through.
pub async fn run_pre_tool_use_hooks(
    config: &HookConfig,
    runner: &dyn HookRunner,
    tool_name: &str,
    subject: &str,
    env: &HashMap<String, String>,
) -> std::io::Result<Option<String>> {
    for hook in config.matching_pre_tool_use(tool_name, subject) {
        let Some(command) = &hook.command else { continue };
        let outcome = runner.run(command, env).await?;
        if outcome.vetoed() {
            return Ok(Some(outcome.stdout));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sensitive_keys() {
        let mut env = HashMap::new();
        env.insert("ANTHROPIC_API_KEY".to_string(), "sk-secret".to_string());
        env.insert("PATH".to_string(), "/usr/bin".to_string());
        let stripped = strip_sensitive_env(&env);
        assert!(!stripped.contains_key("ANTHROPIC_API_KEY"));
        assert!(stripped.contains_key("PATH"));
    }

    #[tokio::test]
    async fn process_runner_reports_exit_code() {
        let runner = ProcessHookRunner;
        let outcome = runner.run("exit 2", &HashMap::new()).await.unwrap();
        assert_eq!(outcome.exit_code, 2);
        assert!(outcome.vetoed());
    }

    #[test]
    fn parses_json_hook_config() {
        let json = r#"{"hooks": [{"matcher": {"event": "PreToolUse", "toolName": "bash"}, "hooks": [{"type": "command", "command": "policy-check"}]}]}"#;
        let config = HookConfig::parse(json).unwrap();
        assert_eq!(config.hooks.len(), 1);
        assert_eq!(config.matching_pre_tool_use("bash", "rm -rf /").len(), 1);
        assert!(config.matching_pre_tool_use("write_file", "/x").is_empty());
    }

    #[tokio::test]
    async fn pre_tool_use_veto_short_circuits_on_exit_code_two() {
        let json = r#"{"hooks": [{"matcher": {"event": "PreToolUse", "toolName": "bash"}, "hooks": [{"type": "command", "command": "echo blocked by policy && exit 2"}]}]}"#;
        let config = HookConfig::parse(json).unwrap();
        let runner = ProcessHookRunner;
        let veto = run_pre_tool_use_hooks(&config, &runner, "bash", "rm -rf /", &HashMap::new())
            .await
            .unwrap();
        assert!(veto.unwrap().contains("blocked by policy"));
    }
}
