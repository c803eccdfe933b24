// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Runner configuration.
//!
//! ```text
//! ProcessRunner
//!  • new/which/exists/with_settings
//!  • arg/args/cwd/env/name/flags/hide_window
//!  • on_output/on_complete/output_mode/read_buffer_size
//!  • timeout/grace_period
//!
//! ProcessFlags: HIDE_WINDOW, PROCESS_GROUP (default)
//! ```
//!
//! Settings are fixed once `run()` borrows the runner; nothing about a run is
//! stored back on it, so one runner can be run any number of times.

use bitflags::bitflags;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::sink::{Lifecycle, OutputMode, OutputSink};
use crate::config::RunnerSettings;
use crate::error::ProcessError;

/// Bytes requested per pipe read unless configured otherwise.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

bitflags! {
    /// Flags controlling how the child is launched and torn down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcessFlags: u32 {
        /// Don't open a console window for the child (Windows only)
        const HIDE_WINDOW = 0x01;
        /// Run the child in its own process group so termination reaches
        /// everything it spawned
        const PROCESS_GROUP = 0x02;
    }
}

impl Default for ProcessFlags {
    fn default() -> Self {
        Self::PROCESS_GROUP
    }
}

/// Launches a program and streams its combined output while it runs.
///
/// # Example
///
/// ```no_run
/// use procstream::{OutputMode, ProcessRunner};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn demo() -> procstream::ProcessResult<()> {
/// let runner = ProcessRunner::new("cargo")
///     .args(["build", "--release"])
///     .output_mode(OutputMode::Lines)
///     .on_output(|line: &[u8]| print!("{}", String::from_utf8_lossy(line)))
///     .on_complete(|| println!("done"));
///
/// runner.run(&CancellationToken::new()).await
/// # }
/// ```
pub struct ProcessRunner {
    /// Path to the executable
    program: PathBuf,
    /// Command-line arguments
    args: Vec<String>,
    /// Working directory
    cwd: Option<PathBuf>,
    /// Extra environment variables
    env: BTreeMap<String, String>,
    /// Display name for logging
    name: Option<String>,
    /// Process flags
    flags: ProcessFlags,
    /// Receiver of output chunks
    output: Option<Arc<dyn OutputSink>>,
    /// Notified once a run ends
    lifecycle: Option<Arc<dyn Lifecycle>>,
    /// Chunk or line delivery
    output_mode: OutputMode,
    /// Bytes per pipe read
    read_buffer_size: usize,
    /// Deadline for the whole run
    timeout: Option<Duration>,
    /// How long a polite stop request gets before the kill
    grace_period: Option<Duration>,
}

impl fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("on_output", &self.output.is_some())
            .field("on_complete", &self.lifecycle.is_some())
            .field("output_mode", &self.output_mode)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("timeout", &self.timeout)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}

impl ProcessRunner {
    /// Creates a runner for the given program.
    ///
    /// The program can be an absolute path, relative path, or just the
    /// executable name. Nothing is checked until `run()`; a missing binary
    /// surfaces as `ProcessError::SpawnFailed`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            name: None,
            flags: ProcessFlags::default(),
            output: None,
            lifecycle: None,
            output_mode: OutputMode::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            timeout: None,
            grace_period: None,
        }
    }

    /// Creates a runner after resolving the program via PATH.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::ExecutableNotFound` if the executable is not
    /// found in PATH.
    pub fn which(program: &str) -> Result<Self, ProcessError> {
        which::which(program)
            .map(|path| Self::new(path).name(program))
            .map_err(|_| ProcessError::ExecutableNotFound {
                name: program.to_string(),
            })
    }

    /// Checks if an executable exists in PATH.
    #[must_use]
    pub fn exists(program: &str) -> bool {
        which::which(program).is_ok()
    }

    /// Applies loaded runner settings on top of the current configuration.
    #[must_use]
    pub fn with_settings(mut self, settings: &RunnerSettings) -> Self {
        self.flags.set(ProcessFlags::HIDE_WINDOW, settings.hide_window);
        self.flags
            .set(ProcessFlags::PROCESS_GROUP, settings.process_group);
        self.output_mode = settings.output_mode;
        self.read_buffer_size = settings.read_buffer_size.max(1);
        self.timeout = settings.timeout();
        self.grace_period = settings.grace_period();
        self
    }

    /// Adds an argument to the command.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Replaces the argument list.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().into_owned())
            .collect();
        self
    }

    /// Sets the working directory for the process.
    #[must_use]
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets an environment variable on top of the inherited environment.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets a display name for logging.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets process flags.
    #[must_use]
    pub const fn flags(mut self, flags: ProcessFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Adds a process flag.
    #[must_use]
    pub fn flag(mut self, flag: ProcessFlags) -> Self {
        self.flags |= flag;
        self
    }

    /// Convenience: don't open a console window for the child (Windows).
    #[must_use]
    pub fn hide_window(self) -> Self {
        self.flag(ProcessFlags::HIDE_WINDOW)
    }

    /// Sets the sink that receives output chunks.
    #[must_use]
    pub fn on_output(mut self, sink: impl OutputSink + 'static) -> Self {
        self.output = Some(Arc::new(sink));
        self
    }

    /// Sets the hook notified when a run ends.
    #[must_use]
    pub fn on_complete(mut self, hook: impl Lifecycle + 'static) -> Self {
        self.lifecycle = Some(Arc::new(hook));
        self
    }

    /// Chooses chunk or line delivery.
    #[must_use]
    pub const fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Sets the number of bytes requested per pipe read (minimum 1).
    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Sets a timeout for the whole run.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Asks the child to stop and waits up to `duration` before killing it.
    ///
    /// Without a grace period, cancellation kills immediately.
    #[must_use]
    pub const fn grace_period(mut self, duration: Duration) -> Self {
        self.grace_period = Some(duration);
        self
    }

    // Getters for field access within the process module

    /// Returns a reference to the program path.
    #[must_use]
    pub const fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Returns a slice of the arguments.
    #[must_use]
    pub fn args_slice(&self) -> &[String] {
        &self.args
    }

    /// Returns the process flags.
    #[must_use]
    pub const fn process_flags(&self) -> ProcessFlags {
        self.flags
    }

    /// Returns the output delivery mode.
    #[must_use]
    pub const fn delivery_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Returns the bytes requested per pipe read.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.read_buffer_size
    }

    pub(super) const fn working_dir(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    pub(super) const fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub(super) fn name_override(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(super) fn output_sink(&self) -> Option<Arc<dyn OutputSink>> {
        self.output.clone()
    }

    pub(super) fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        self.lifecycle.as_deref()
    }

    pub(super) const fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    pub(super) const fn grace_duration(&self) -> Option<Duration> {
        self.grace_period
    }
}
