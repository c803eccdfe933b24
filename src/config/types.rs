// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types.
//!
//! ```text
//! [runner]                      [log]
//! read_buffer_size = 1024       console_level = 3
//! output_mode = "chunks"        file_level = 5
//! hide_window = false           log_file = "runner.log"
//! process_group = true          json = false
//! timeout_ms = 60000
//! grace_period_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::process::{DEFAULT_READ_BUFFER_SIZE, OutputMode};
use crate::error::ConfigError;
use crate::logging::{LogConfig, LogLevel};

/// Defaults applied to runners through `ProcessRunner::with_settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSettings {
    /// Bytes requested per pipe read.
    pub read_buffer_size: usize,
    /// Chunk or line delivery.
    pub output_mode: OutputMode,
    /// Don't open a console window for children (Windows).
    pub hide_window: bool,
    /// Run children in their own process group.
    pub process_group: bool,
    /// Deadline for a whole run, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Time between the stop request and the kill, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_ms: Option<u64>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            output_mode: OutputMode::default(),
            hide_window: false,
            process_group: true,
            timeout_ms: None,
            grace_period_ms: None,
        }
    }
}

impl RunnerSettings {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn grace_period(&self) -> Option<Duration> {
        self.grace_period_ms.map(Duration::from_millis)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero buffer size, timeout or
    /// grace period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_buffer_size == 0 {
            return Err(invalid("read_buffer_size", "must be greater than zero"));
        }
        if self.timeout_ms == Some(0) {
            return Err(invalid("timeout_ms", "must be greater than zero when set"));
        }
        if self.grace_period_ms == Some(0) {
            return Err(invalid(
                "grace_period_ms",
                "must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: "runner".to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Logging options, turned into a [`LogConfig`] for `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub console_level: LogLevel,
    pub file_level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Write the log file as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            console_level: LogLevel::Info,
            file_level: LogLevel::Trace,
            log_file: None,
            json: false,
        }
    }
}

impl LogSettings {
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig::builder()
            .with_console_level(self.console_level)
            .with_file_level(self.file_level)
            .maybe_with_log_file(self.log_file.clone())
            .with_json_file(self.json)
            .build()
    }
}
