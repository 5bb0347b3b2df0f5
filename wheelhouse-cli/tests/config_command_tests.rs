//! Integration tests for `wheelhouse config` command.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn wheelhouse() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wheelhouse"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("wheelhouse.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[storage]
backend = "s3"
bucket = "vllm-wheels"

[publish]
dry_run = true
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let result = wheelhouse_core::config::WheelhouseConfig::load(&config_path).await;

    // Then: Should succeed
    let config = result.expect("valid config should load successfully");
    assert_eq!(config.storage.bucket, "vllm-wheels");
    assert_eq!(config.index.index_prefix, "simple");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(&config_path, "[storage\nbucket = \"x\"\n").expect("should write bad config");

    let result = wheelhouse_core::config::WheelhouseConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_validate_invalid_backend() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("wheelhouse.toml");

    fs::write(&config_path, "[storage]\nbackend = \"gcs\"\n").expect("should write config");

    let err = wheelhouse_core::config::WheelhouseConfig::load(&config_path)
        .await
        .expect_err("unknown backend should be rejected");
    assert!(err.to_string().contains("storage.backend"));
}

#[test]
fn test_cli_config_validate_missing_file_exits_2() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("missing.toml");

    let output = wheelhouse()
        .args(["config", "validate", "--config"])
        .arg(&config_path)
        .output()
        .expect("should run wheelhouse");

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INVALID"));
}

#[test]
fn test_cli_config_show_json() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("wheelhouse.toml");
    fs::write(&config_path, "[storage]\nbucket = \"vllm-wheels\"\n").expect("should write config");

    let output = wheelhouse()
        .args(["--output", "json", "config", "show", "--section", "storage", "--config"])
        .arg(&config_path)
        .output()
        .expect("should run wheelhouse");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["section"], "storage");
}
