// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel, init_logging};

#[test]
fn test_log_level_conversion() {
    let conversions: Vec<_> = [0u8, 3, 5, 6]
        .into_iter()
        .map(|n| (n, LogLevel::from_u8(n)))
        .collect();
    insta::assert_debug_snapshot!(conversions, @r"
    [
        (
            0,
            Some(
                Off,
            ),
        ),
        (
            3,
            Some(
                Info,
            ),
        ),
        (
            5,
            Some(
                Trace,
            ),
        ),
        (
            6,
            None,
        ),
    ]
    ");
    assert_eq!(LogLevel::default(), LogLevel::Info);
    assert_eq!(LogLevel::Debug.as_u8(), 4);
    assert!(LogLevel::Warn < LogLevel::Trace);
}

#[test]
fn test_log_level_filter_strings() {
    let filters: Vec<_> = (0..=5)
        .filter_map(LogLevel::from_u8)
        .map(LogLevel::to_filter_string)
        .collect();
    assert_eq!(filters, ["off", "error", "warn", "info", "debug", "trace"]);
    assert_eq!(LogLevel::Off.to_tracing_level(), None);
    assert_eq!(
        LogLevel::Debug.to_tracing_level(),
        Some(tracing::Level::DEBUG)
    );
}

#[test]
fn test_log_level_rejects_out_of_range() {
    let err = LogLevel::new(9).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'level' in section '[log]': log level must be 0-5, got 9"
    );
    assert!(LogLevel::try_from(4u8).is_ok());
}

#[test]
fn test_log_level_serde_as_number() {
    let json = serde_json::to_string(&LogLevel::Warn).unwrap();
    assert_eq!(json, "2");
    let parsed: LogLevel = serde_json::from_str("4").unwrap();
    assert_eq!(parsed, LogLevel::Debug);
    assert!(serde_json::from_str::<LogLevel>("7").is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::Info);
    assert_eq!(config.file_level(), LogLevel::Trace);
    assert!(config.log_file().is_none());
    assert!(!config.json_file());
    assert!(config.show_timestamps());
    assert!(!config.show_target());
}

#[test]
fn test_init_logging_with_file_only_once() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("nested").join("runner.log");
    let config = LogConfig::builder()
        .with_console_level(LogLevel::Off)
        .with_log_file(log_path.clone())
        .with_json_file(true)
        .build();

    let guard = init_logging(&config).expect("first initialization should succeed");
    assert!(log_path.exists(), "log file should be created");

    let second = init_logging(&LogConfig::default());
    assert!(second.is_err(), "a second global subscriber must be rejected");
    drop(guard);
}
