// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//! ProcessError (returned by ProcessRunner::run)
//!   launch   SpawnFailed, ExecutableNotFound, WaitFailed
//!   exit     NonZeroExit { status }
//!   stream   OutputFailed, PipeFailed
//!   cancel   Cancelled, Timeout
//!   internal TaskFailed
//!
//! ConfigError  ParseError, InvalidValue
//! JobError     CreateFailed, AssignFailed, ... (Windows)
//!
//! config / logging plumbing: anyhow::Result
//! ```

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`ProcessError`].
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

// --- Process Errors ---

/// Errors produced while running a child process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// The output pipe could not be created.
    #[error("failed to create output pipe: {source}")]
    PipeFailed {
        #[source]
        source: std::io::Error,
    },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process to exit failed.
    #[error("failed to wait for process '{command}': {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a failure status.
    #[error("process '{command}' exited with {status}")]
    NonZeroExit { command: String, status: ExitStatus },

    /// Reading the combined output failed.
    #[error("failed to read output from process '{command}': {source}")]
    OutputFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before the process finished.
    #[error("process '{command}' was cancelled")]
    Cancelled { command: String },

    /// Process exceeded its configured timeout.
    #[error("process '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// A launcher or reader task panicked.
    #[error("task for process '{command}' failed: {message}")]
    TaskFailed { command: String, message: String },
}

impl ProcessError {
    /// Returns true if the run ended because of cancellation or timeout.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Timeout { .. })
    }

    /// Returns the exit code for `NonZeroExit`, if the OS reported one.
    ///
    /// A Unix process killed by a signal has no exit code.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { status, .. } => status.code(),
            _ => None,
        }
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Job Object Errors (Windows) ---

/// Windows Job Object errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Failed to create a Job Object.
    #[error("failed to create job object")]
    CreateFailed(#[source] std::io::Error),

    /// Failed to configure a Job Object.
    #[error("failed to configure job object")]
    ConfigureFailed(#[source] std::io::Error),

    /// Failed to assign a process to a Job Object.
    #[error("failed to assign process (PID {pid}) to job")]
    AssignFailed {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    /// Failed to terminate a Job Object.
    #[error("failed to terminate job")]
    TerminateFailed(#[source] std::io::Error),
}
