use serde::{Deserialize, Serialize};

/// Default permission mode a [`crate::OrchestratorConfig`] falls back to when
/// no rule matches a requested tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    Default,
    Plan,
    AcceptEdits,
    DontAsk,
    Bypass,
}

impl Default for PermissionMode {
    fn default() -> Self {
        Self::Default
    }
}

/// Controls audit logging and decision caching for the permission manager.
/// Mirrors the fields a production agent needs to reason about command
/// resolution and ask-decision caching without touching any UI layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub resolve_commands: bool,

    #[serde(default = "default_true")]
    pub audit_enabled: bool,

    #[serde(default = "default_audit_directory")]
    pub audit_directory: String,

    #[serde(default = "default_true")]
    pub log_allowed_commands: bool,

    #[serde(default = "default_true")]
    pub log_denied_commands: bool,

    #[serde(default = "default_true")]
    pub log_permission_prompts: bool,

    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    #[serde(default)]
    pub mode: PermissionMode,

    /// Path to the permission rule file (§6). Relative to the workspace root
    /// unless absolute.
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
}

fn default_true() -> bool {
    true
}

fn default_audit_directory() -> String {
    "~/.config/forgelet/logs".to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_rules_file() -> String {
    ".forgelet/permissions.json".to_string()
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            resolve_commands: default_true(),
            audit_enabled: default_true(),
            audit_directory: default_audit_directory(),
            log_allowed_commands: default_true(),
            log_denied_commands: default_true(),
            log_permission_prompts: default_true(),
            cache_enabled: default_true(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            mode: PermissionMode::default(),
            rules_file: default_rules_file(),
        }
    }
}
