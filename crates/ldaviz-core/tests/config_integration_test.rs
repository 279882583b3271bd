//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use ldaviz_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig, CONFIG_FILE_NAME};
use ldaviz_core::models::{Aggregation, StorageBackend, TopicMetric};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn clear_env() {
    for key in ["LDAVIZ_METRIC", "LDAVIZ_AGGREGATION", "LDAVIZ_BACKEND", "LDAVIZ_GENERATOR"] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_directory_without_config_file_uses_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let config = LayeredConfig::for_directory(dir.path(), CliConfigOverrides::default()).unwrap();

    assert_eq!(config.metric.value, TopicMetric::Bhattacharyya);
    assert_eq!(config.metric.source, ConfigSource::Default);
    assert_eq!(config.backend.value, StorageBackend::Files);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "metric = \"Hellinger\"\naggregation = \"Hausdorff\"\n",
    )
    .unwrap();

    env::set_var("LDAVIZ_METRIC", "js");
    let config = LayeredConfig::for_directory(dir.path(), CliConfigOverrides::default()).unwrap();
    clear_env();

    assert_eq!(config.metric.value, TopicMetric::JensenShannon);
    assert_eq!(config.metric.source, ConfigSource::Environment);
    assert_eq!(config.aggregation.value, Aggregation::Hausdorff);
    assert_eq!(config.aggregation.source, ConfigSource::File);
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    let dir = TempDir::new().unwrap();

    env::set_var("LDAVIZ_BACKEND", "sqlite");
    env::set_var("LDAVIZ_GENERATOR", "./from_env.sh");
    let overrides = CliConfigOverrides {
        backend: Some(StorageBackend::Files),
        ..Default::default()
    };
    let config = LayeredConfig::for_directory(dir.path(), overrides).unwrap();
    clear_env();

    assert_eq!(config.backend.value, StorageBackend::Files);
    assert_eq!(config.backend.source, ConfigSource::Cli);
    assert_eq!(config.generator_command.value.as_deref(), Some("./from_env.sh"));
    assert_eq!(config.generator_command.source, ConfigSource::Environment);
}

#[test]
#[serial]
fn test_invalid_environment_value_is_ignored() {
    clear_env();

    env::set_var("LDAVIZ_AGGREGATION", "median");
    let config = LayeredConfig::with_defaults().load_from_env();
    clear_env();

    assert_eq!(config.aggregation.value, Aggregation::Minimal);
    assert_eq!(config.aggregation.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_malformed_config_file_is_an_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "metric = [unclosed").unwrap();

    let result = LayeredConfig::for_directory(dir.path(), CliConfigOverrides::default());
    assert!(result.is_err());
}
