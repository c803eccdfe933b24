// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runner and logging defaults loaded from TOML and the environment.
//!
//! ```text
//! lowest                                              highest
//! defaults < TOML files / strings < PROCSTREAM_* env < set()
//!
//! PROCSTREAM_RUNNER__OUTPUT_MODE=lines    runner.output_mode = "lines"
//! PROCSTREAM_RUNNER__GRACE_PERIOD_MS=500  runner.grace_period_ms = 500
//! PROCSTREAM_LOG__CONSOLE_LEVEL=4         log.console_level = 4
//! ```
//!
//! `Config::runner` feeds `ProcessRunner::with_settings`, `Config::log`
//! feeds `logging::init_logging` through `LogSettings::to_log_config`.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

use loader::ConfigLoader;
pub use types::{LogSettings, RunnerSettings};

/// Prefix of the environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "PROCSTREAM";

/// `[runner]` and `[log]` sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runner: RunnerSettings,
    pub log: LogSettings,
}

impl Config {
    /// Starts an empty layered loader.
    ///
    /// ```no_run
    /// use procstream::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("procstream.toml")
    ///     .add_toml_file_optional("procstream.local.toml")
    ///     .with_env_prefix("PROCSTREAM")
    ///     .set("runner.output_mode", "lines")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Standard layering: an optional TOML file, then `PROCSTREAM_*`
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or invalid, or if a value
    /// does not fit its field.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let loader = match file {
            Some(path) => Self::builder().add_toml_file_optional(path),
            None => Self::builder(),
        };
        loader.with_env_prefix(ENV_PREFIX).build()
    }

    /// Reads a single TOML file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML or holds unknown or
    /// out-of-range values.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Range checks that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value as a `ConfigError`.
    pub fn validate(&self) -> Result<()> {
        self.runner.validate()?;
        Ok(())
    }
}
