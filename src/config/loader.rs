// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Layered configuration loading.
//!
//! ```text
//! layers (in call order)       then              then
//! file | optional | string --> PROCSTREAM_* env --> set() overrides
//!                                   |
//!                                   v
//!                  build() --> Config --> validate()
//! ```
//!
//! Nothing is read until `build()`; the loader only records what to read.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Environment, File, FileFormat, Value};

use super::Config;
use crate::error::{ConfigError, Result};

/// One TOML layer, applied in the order it was added.
#[derive(Debug, Clone)]
enum Layer {
    File { path: PathBuf, required: bool },
    Inline(String),
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File {
                path,
                required: true,
            } => write!(f, "[file] {}", path.display()),
            Self::File { path, .. } => write!(f, "[optional] {}", path.display()),
            Self::Inline(_) => f.write_str("[string] <string>"),
        }
    }
}

/// Collects configuration layers and merges them into a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    layers: Vec<Layer>,
    env_prefix: Option<String>,
    overrides: Vec<(String, Value)>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file that must exist when `build()` runs.
    #[must_use]
    pub fn add_toml_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Adds a TOML file that is skipped if absent.
    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    #[must_use]
    pub fn add_toml_str(mut self, content: &str) -> Self {
        self.layers.push(Layer::Inline(content.to_string()));
        self
    }

    /// Reads `<PREFIX>_<SECTION>__<KEY>` environment variables at build time.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Sets a dotted-key override, e.g. `set("runner.output_mode", "lines")`.
    ///
    /// Overrides beat every other layer.
    #[must_use]
    pub fn set<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Describes the layers that will be read, skipping missing optional files.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|layer| match layer {
                Layer::File {
                    path,
                    required: false,
                } => path.exists(),
                _ => true,
            })
            .map(ToString::to_string)
            .collect()
    }

    /// Merges every layer and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing, a layer is not valid
    /// TOML, an override key is malformed, the merged values do not fit
    /// `Config`, or a value is out of range (see `Config::validate`).
    pub fn build(self) -> Result<Config> {
        let origin = self.origin();
        let mut builder = config::Config::builder();

        for layer in self.layers {
            builder = match layer {
                Layer::File { path, required } => builder
                    .add_source(File::from(path).format(FileFormat::Toml).required(required)),
                Layer::Inline(content) => {
                    builder.add_source(File::from_str(&content, FileFormat::Toml))
                }
            };
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        for (key, value) in self.overrides {
            builder = builder
                .set_override(&key, value)
                .with_context(|| format!("invalid config override '{key}'"))?;
        }

        let config: Config = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| ConfigError::ParseError {
                path: origin,
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Names the layers for error messages.
    fn origin(&self) -> String {
        if self.layers.is_empty() {
            return "<defaults>".to_string();
        }
        self.layers
            .iter()
            .map(|layer| match layer {
                Layer::File { path, .. } => path.display().to_string(),
                Layer::Inline(_) => "<string>".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
