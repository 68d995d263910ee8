use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("failed to parse YAML config {path}: {source}")]
    ParseYaml { path: String, source: String },

    #[error("unsupported config file extension: {path}")]
    UnsupportedExtension { path: String },

    #[error("invalid environment override {key}: {message}")]
    InvalidEnvOverride { key: String, message: String },
}

impl ConfigError {
    /// Every config error is a permanent, non-retryable condition: re-reading
    /// or re-parsing the same file without operator intervention always fails
    /// the same way.
    pub fn category(&self) -> forgelet_commons::ErrorCategory {
        use forgelet_commons::ErrorCategory;
        match self {
            ConfigError::Read { .. } => ErrorCategory::ResourceNotFound,
            ConfigError::ParseToml { .. } | ConfigError::ParseYaml { .. } => {
                ErrorCategory::InvalidParameters
            }
            ConfigError::UnsupportedExtension { .. } => ErrorCategory::InvalidParameters,
            ConfigError::InvalidEnvOverride { .. } => ErrorCategory::InvalidParameters,
        }
    }
}
