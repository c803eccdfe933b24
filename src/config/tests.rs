// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{Config, ConfigLoader, RunnerSettings};
use crate::core::process::OutputMode;
use crate::logging::LogLevel;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(
        serde_json::to_value(&config).unwrap(),
        serde_json::json!({
            "runner": {
                "read_buffer_size": 1024,
                "output_mode": "chunks",
                "hide_window": false,
                "process_group": true,
            },
            "log": {
                "console_level": 3,
                "file_level": 5,
                "json": false,
            },
        })
    );
}

#[test]
fn test_parse_runner_section() {
    let config = Config::parse(
        r#"
[runner]
read_buffer_size = 4096
output_mode = "lines"
hide_window = true
timeout_ms = 60000
grace_period_ms = 250
"#,
    )
    .unwrap();

    assert_eq!(config.runner.read_buffer_size, 4096);
    assert_eq!(config.runner.output_mode, OutputMode::Lines);
    assert!(config.runner.hide_window);
    assert!(config.runner.process_group, "unset keys keep their default");
    assert_eq!(config.runner.timeout(), Some(Duration::from_secs(60)));
    assert_eq!(config.runner.grace_period(), Some(Duration::from_millis(250)));
}

#[test]
fn test_parse_log_section() {
    let config = Config::parse(
        r#"
[log]
console_level = 4
log_file = "logs/runner.log"
json = true
"#,
    )
    .unwrap();

    assert_eq!(config.log.console_level, LogLevel::Debug);
    let log_config = config.log.to_log_config();
    assert_eq!(log_config.console_level(), LogLevel::Debug);
    assert_eq!(log_config.file_level(), LogLevel::Trace);
    assert_eq!(log_config.log_file(), Some(Path::new("logs/runner.log")));
    assert!(log_config.json_file());
}

#[test]
fn test_zero_buffer_size_rejected() {
    let err = Config::parse("[runner]\nread_buffer_size = 0\n").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'read_buffer_size' in section '[runner]': must be greater than zero"
    );
}

#[test]
fn test_zero_grace_period_rejected() {
    let settings = RunnerSettings {
        grace_period_ms: Some(0),
        ..RunnerSettings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn test_unknown_key_rejected() {
    let err = Config::parse("[runner]\nretries = 3\n").unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("failed to parse config file '<string>'"),
        "unexpected message: {message}"
    );
    assert!(message.contains("retries"), "unexpected message: {message}");
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Config::parse("[log]\nconsole_level = 9\n").is_err());
}

#[test]
fn test_later_sources_override_earlier() {
    let config = ConfigLoader::new()
        .add_toml_str("[runner]\nread_buffer_size = 512\noutput_mode = \"lines\"\n")
        .add_toml_str("[runner]\nread_buffer_size = 2048\n")
        .set("runner.hide_window", true)
        .build()
        .unwrap();

    assert_eq!(config.runner.read_buffer_size, 2048);
    assert_eq!(config.runner.output_mode, OutputMode::Lines);
    assert!(config.runner.hide_window);
}

#[test]
fn test_from_file_and_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("procstream.toml");
    std::fs::write(&path, "[runner]\nprocess_group = false\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(!config.runner.process_group);

    let missing = dir.path().join("missing.toml");
    let loader = ConfigLoader::new()
        .add_toml_file(&path)
        .add_toml_file_optional(&missing);
    assert_eq!(
        loader.sources(),
        vec![format!("[file] {}", path.display())],
        "missing optional file is not listed"
    );
    assert!(loader.build().is_ok());
}

#[test]
fn test_required_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::from_file(dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_load_with_optional_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("procstream.toml");

    let absent = Config::load(Some(&path)).unwrap();
    assert_eq!(absent.runner, RunnerSettings::default());

    std::fs::write(&path, "[runner]\noutput_mode = \"lines\"\n").unwrap();
    let present = Config::load(Some(&path)).unwrap();
    assert_eq!(present.runner.output_mode, OutputMode::Lines);
}
