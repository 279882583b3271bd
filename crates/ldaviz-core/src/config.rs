use crate::error::{LdavizError, Result};
use crate::models::{Aggregation, StorageBackend, TopicMetric};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Name of the per-directory configuration file
pub const CONFIG_FILE_NAME: &str = "ldaviz.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for ldaviz
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub metric: ConfigValue<TopicMetric>,
    pub aggregation: ConfigValue<Aggregation>,
    pub backend: ConfigValue<StorageBackend>,
    pub generator_command: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            metric: ConfigValue::new(TopicMetric::default(), ConfigSource::Default),
            aggregation: ConfigValue::new(Aggregation::default(), ConfigSource::Default),
            backend: ConfigValue::new(StorageBackend::Files, ConfigSource::Default),
            generator_command: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load the configuration layers for a workspace directory
    ///
    /// Reads `ldaviz.toml` when present, then the environment, then applies
    /// the CLI overrides.
    pub fn for_directory<P: AsRef<Path>>(dir: P, overrides: CliConfigOverrides) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        let mut config = Self::with_defaults();
        if path.exists() {
            config = config.load_from_file(&path)?;
        }
        let mut config = config.load_from_env();
        config.update_from_cli(overrides);
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| LdavizError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| LdavizError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(metric) = file_config.metric {
            self.metric.update(metric, ConfigSource::File);
        }

        if let Some(aggregation) = file_config.aggregation {
            self.aggregation.update(aggregation, ConfigSource::File);
        }

        if let Some(backend) = file_config.backend {
            self.backend.update(backend, ConfigSource::File);
        }

        if let Some(command) = file_config.generator_command {
            self.generator_command.update(Some(command), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // LDAVIZ_METRIC
        if let Ok(metric_str) = env::var("LDAVIZ_METRIC") {
            match parse_metric(&metric_str) {
                Ok(metric) => self.metric.update(metric, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LDAVIZ_METRIC value '{}': expected bhattacharyya, hellinger, kl, js, or euclidean",
                    metric_str
                ),
            }
        }

        // LDAVIZ_AGGREGATION
        if let Ok(aggregation_str) = env::var("LDAVIZ_AGGREGATION") {
            match parse_aggregation(&aggregation_str) {
                Ok(aggregation) => self.aggregation.update(aggregation, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LDAVIZ_AGGREGATION value '{}': expected minimal or hausdorff",
                    aggregation_str
                ),
            }
        }

        // LDAVIZ_BACKEND
        if let Ok(backend_str) = env::var("LDAVIZ_BACKEND") {
            match parse_backend(&backend_str) {
                Ok(backend) => self.backend.update(backend, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LDAVIZ_BACKEND value '{}': expected files or sqlite",
                    backend_str
                ),
            }
        }

        // LDAVIZ_GENERATOR
        if let Ok(command) = env::var("LDAVIZ_GENERATOR") {
            self.generator_command.update(Some(command), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(metric) = overrides.metric {
            self.metric.update(metric, ConfigSource::Cli);
        }

        if let Some(aggregation) = overrides.aggregation {
            self.aggregation.update(aggregation, ConfigSource::Cli);
        }

        if let Some(backend) = overrides.backend {
            self.backend.update(backend, ConfigSource::Cli);
        }

        if let Some(command) = overrides.generator_command {
            self.generator_command.update(Some(command), ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("metric".to_string(), (self.metric.value.to_string(), self.metric.source));

        map.insert(
            "aggregation".to_string(),
            (self.aggregation.value.to_string(), self.aggregation.source),
        );

        map.insert("backend".to_string(), (self.backend.value.to_string(), self.backend.source));

        map.insert(
            "generator_command".to_string(),
            (
                self.generator_command.value.clone().unwrap_or_else(|| "(none)".to_string()),
                self.generator_command.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    metric: Option<TopicMetric>,
    aggregation: Option<Aggregation>,
    backend: Option<StorageBackend>,
    generator_command: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub metric: Option<TopicMetric>,
    pub aggregation: Option<Aggregation>,
    pub backend: Option<StorageBackend>,
    pub generator_command: Option<String>,
}

/// Parse topic metric from string
pub fn parse_metric(s: &str) -> Result<TopicMetric> {
    match s.to_lowercase().as_str() {
        "bhattacharyya" | "bc" => Ok(TopicMetric::Bhattacharyya),
        "hellinger" => Ok(TopicMetric::Hellinger),
        "kullback-leibler" | "kl" => Ok(TopicMetric::KullbackLeibler),
        "jensen-shannon" | "js" => Ok(TopicMetric::JensenShannon),
        "euclidean" | "l2" => Ok(TopicMetric::Euclidean),
        _ => Err(LdavizError::ConfigInvalid {
            key: "metric".to_string(),
            reason: format!(
                "Invalid metric: {}. Use bhattacharyya, hellinger, kl, js, or euclidean",
                s
            ),
        }),
    }
}

/// Parse aggregation mode from string
pub fn parse_aggregation(s: &str) -> Result<Aggregation> {
    match s.to_lowercase().as_str() {
        "minimal" | "min" => Ok(Aggregation::Minimal),
        "hausdorff" => Ok(Aggregation::Hausdorff),
        _ => Err(LdavizError::ConfigInvalid {
            key: "aggregation".to_string(),
            reason: format!("Invalid aggregation: {}. Use minimal or hausdorff", s),
        }),
    }
}

/// Parse storage backend from string
pub fn parse_backend(s: &str) -> Result<StorageBackend> {
    match s.to_lowercase().as_str() {
        "files" | "file" => Ok(StorageBackend::Files),
        "sqlite" | "db" => Ok(StorageBackend::Sqlite),
        _ => Err(LdavizError::ConfigInvalid {
            key: "backend".to_string(),
            reason: format!("Invalid backend: {}. Use files or sqlite", s),
        }),
    }
}
