//! Application configuration.
//!
//! Loaded from YAML files and environment variables with the `config` crate.

mod orchestrator;

pub use orchestrator::OrchestratorConfig;

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "promise.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "PROMISE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "PROMISE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "PROMISE_LOG";

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Main configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Composite action orchestration settings.
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Sources, later overriding earlier:
    /// 1. `promise.yaml` in the current directory (if present)
    /// 2. File given by `path` (if provided)
    /// 3. File named by `CONFIG_ENV_VAR` (if set)
    /// 4. `CONFIG_ENV_PREFIX`-prefixed environment variables, `__` separated
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
