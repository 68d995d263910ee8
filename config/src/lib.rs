//! Layered configuration for a forgelet orchestrator run: permission mode
//! and rule file location, worker pool capacities, retry/iteration budgets,
//! and the model alias / role->model tables every role agent resolves its
//! model through.

pub mod error;
pub mod loader;
pub mod models;
pub mod orchestrator_config;
pub mod permissions;
pub mod pools;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use models::{ModelAliasTable, RoleModelTable};
pub use orchestrator_config::OrchestratorConfig;
pub use permissions::{PermissionMode, PermissionsConfig};
pub use pools::{PoolsConfig, RetryConfig};
