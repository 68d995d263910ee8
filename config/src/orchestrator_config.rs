use serde::{Deserialize, Serialize};

use crate::models::{ModelAliasTable, RoleModelTable};
use crate::permissions::PermissionsConfig;
use crate::pools::{PoolsConfig, RetryConfig};

/// Root configuration for a forgelet orchestrator run. Loaded by
/// [`crate::loader::ConfigLoader`] from a layered TOML file plus environment
/// overrides, the same two-stage shape the teacher's config manager uses for
/// its own workspace configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub permissions: PermissionsConfig,

    #[serde(default)]
    pub pools: PoolsConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub models: ModelAliasTable,

    #[serde(default)]
    pub roles: RoleModelTable,

    /// Path to the hook configuration file (§6), relative to the workspace
    /// root unless absolute.
    #[serde(default = "default_hooks_file")]
    pub hooks_file: String,
}

fn default_hooks_file() -> String {
    ".forgelet/hooks.json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_pool_sizes() {
        let config = OrchestratorConfig::default();
        assert!(config.pools.executors > 0);
        assert_eq!(config.hooks_file, ".forgelet/hooks.json");
    }
}
