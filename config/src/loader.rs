use std::path::Path;

use crate::OrchestratorConfig;
use crate::error::ConfigError;

const ENV_PREFIX: &str = "FORGELET_";

/// Loads an [`OrchestratorConfig`] the same way the teacher's config manager
/// layers its settings: start from defaults, overlay a project TOML file if
/// present, then apply a handful of environment variable overrides so CI and
/// local runs can tweak pool sizes and permission mode without touching the
/// file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `workspace_root` is searched for `.forgelet/config.toml`.
    pub fn load(workspace_root: &Path) -> Result<OrchestratorConfig, ConfigError> {
        let mut config = Self::load_file(workspace_root)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn load_file(workspace_root: &Path) -> Result<OrchestratorConfig, ConfigError> {
        let path = workspace_root.join(".forgelet").join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no project config found, using defaults");
            return Ok(OrchestratorConfig::default());
        }
        let path_str = path.display().to_string();
        tracing::debug!(path = %path_str, "loading project config");
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path_str.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::ParseToml {
            path: path_str,
            source: Box::new(source),
        })
    }

    fn apply_env_overrides(config: &mut OrchestratorConfig) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(format!("{ENV_PREFIX}POOLS_EXECUTORS")) {
            config.pools.executors = parse_usize(&raw, "POOLS_EXECUTORS")?;
            tracing::debug!(value = config.pools.executors, "POOLS_EXECUTORS override applied");
        }
        if let Ok(raw) = std::env::var(format!("{ENV_PREFIX}POOLS_REVIEWERS")) {
            config.pools.reviewers = parse_usize(&raw, "POOLS_REVIEWERS")?;
            tracing::debug!(value = config.pools.reviewers, "POOLS_REVIEWERS override applied");
        }
        if let Ok(raw) = std::env::var(format!("{ENV_PREFIX}POOLS_FIXERS")) {
            config.pools.fixers = parse_usize(&raw, "POOLS_FIXERS")?;
            tracing::debug!(value = config.pools.fixers, "POOLS_FIXERS override applied");
        }
        if let Ok(raw) = std::env::var(format!("{ENV_PREFIX}RETRY_MAX_RETRIES")) {
            config.retry.max_retries = raw.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "RETRY_MAX_RETRIES".to_string(),
                message: format!("expected an integer, got {raw:?}"),
            })?;
            tracing::debug!(value = config.retry.max_retries, "RETRY_MAX_RETRIES override applied");
        }
        Ok(())
    }
}

fn parse_usize(raw: &str, key: &str) -> Result<usize, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            message: format!("expected a positive integer, got {raw:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::load(dir.path()).unwrap();
        assert_eq!(config.pools.executors, 4);
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".forgelet")).unwrap();
        std::fs::write(
            dir.path().join(".forgelet/config.toml"),
            "[pools]\nexecutors = 8\n",
        )
        .unwrap();
        let config = ConfigLoader::load(dir.path()).unwrap();
        assert_eq!(config.pools.executors, 8);
    }
}
