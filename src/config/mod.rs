//! Application configuration.
//!
//! Aggregates proxy, discovery and retry settings into a single Config
//! struct that can be loaded from YAML files or environment variables.

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "interpose.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "INTERPOSE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "INTERPOSE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "INTERPOSE_LOG";

use serde::Deserialize;

use crate::error::AopError;

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Proxy behaviour.
    pub proxy: ProxyConfig,
    /// Advice-source discovery.
    pub aspects: AspectsConfig,
    /// Defaults for retry advice.
    pub retry: RetryConfig,
}

/// Proxy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Make the current proxy id visible to code running inside a call.
    pub expose_proxy: bool,
}

/// Advice-source discovery configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AspectsConfig {
    /// Regexes over component ids. Empty means every component is eligible.
    pub include: Vec<String>,
}

/// Backoff settings for retry advice.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub min_delay_ms: u64,
    /// Cap on the delay between retries.
    pub max_delay_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_times: usize,
    /// Randomise delays to avoid synchronised retries.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10,
            max_delay_ms: 2_000,
            max_times: 3,
            jitter: true,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `interpose.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, `__` separated
    pub fn load(path: Option<&str>) -> Result<Self, AopError> {
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

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self {
            retry: RetryConfig {
                min_delay_ms: 1,
                max_delay_ms: 5,
                max_times: 3,
                jitter: false,
            },
            ..Self::default()
        }
    }
}
