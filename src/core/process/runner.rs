// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and output streaming.
//!
//! ```text
//! run(token)
//!   |  (already cancelled --> Cancelled)
//!   v
//! open_pipe() --> (reader, writer)
//! scope = token.child_token()
//!   |
//!   +--> launcher (JoinSet::spawn)
//!   |      spawn(stdout = stderr = writer)
//!   |      select! wait | scope.cancelled | timeout
//!   |      terminate tree on cancel / timeout
//!   |      drop(writer)  after the child is reaped
//!   |      select! drained | scope.cancelled | timeout
//!   |      kill the tree if descendants still hold the pipe
//!   |
//!   +--> reader (JoinSet::spawn_blocking)
//!   |      read chunk --> OutputSink until EOF
//!   |      drained.cancel() on exit (drop guard)
//!   |
//!   v
//! join_next(): first error wins, scope.cancel()
//!   |
//!   v
//! Lifecycle::on_complete()   every path, including a dropped future
//! ```

use std::io::PipeWriter;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::builder::{ProcessFlags, ProcessRunner};
use super::io::{drain_pipe, open_pipe};
use super::sink::{Lifecycle, OutputDispatch};
use crate::error::{ProcessError, ProcessResult};

#[cfg(windows)]
use crate::core::job::JobObject;

impl ProcessRunner {
    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    fn command_line(&self) -> String {
        use std::fmt::Write as _;

        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Runs the process, streaming its combined output until it exits.
    ///
    /// Output reaches the configured [`OutputSink`](super::OutputSink) while
    /// the process runs. Cancelling `token` terminates the child and ends the
    /// run promptly, including when the child has already exited and only
    /// its descendants still hold the output pipe. The completion hook fires
    /// exactly once after both the launcher and the reader have finished,
    /// whatever the outcome.
    ///
    /// Dropping the returned future also fires the hook, at drop time. The
    /// child is killed on drop, but the reader thread may still be draining
    /// output left in the pipe when the hook runs.
    ///
    /// # Errors
    ///
    /// Returns the first failure observed:
    /// - `SpawnFailed` if the program cannot be started.
    /// - `NonZeroExit` if it exits with a failure status.
    /// - `OutputFailed` / `PipeFailed` on pipe errors.
    /// - `Cancelled` if `token` is cancelled, `Timeout` if the configured
    ///   timeout elapses.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tokio_util::sync::CancellationToken;
    /// use std::time::Duration;
    ///
    /// let token = CancellationToken::new();
    /// let token_clone = token.clone();
    ///
    /// // Cancel after 5 seconds
    /// tokio::spawn(async move {
    ///     tokio::time::sleep(Duration::from_secs(5)).await;
    ///     token_clone.cancel();
    /// });
    ///
    /// ProcessRunner::new("long-running-command").run(&token).await?;
    /// ```
    pub async fn run(&self, token: &CancellationToken) -> ProcessResult<()> {
        let _complete = CompleteOnDrop(self.lifecycle());
        self.run_streaming(token).await
    }

    async fn run_streaming(&self, token: &CancellationToken) -> ProcessResult<()> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if token.is_cancelled() {
            debug!(process = %name, "cancelled before start");
            return Err(ProcessError::Cancelled { command: name });
        }

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let (reader, writer) = open_pipe()?;
        let command = self.build_command(&writer)?;
        let scope = token.child_token();
        let drained = CancellationToken::new();

        let launch = Launch {
            command,
            writer,
            name: name.clone(),
            cmd_line,
            group: self.process_flags().contains(ProcessFlags::PROCESS_GROUP),
            timeout: self.timeout_duration(),
            grace: self.grace_duration(),
            drained: drained.clone(),
        };
        let dispatch = OutputDispatch::new(self.output_sink(), self.delivery_mode());
        let chunk_size = self.chunk_size();
        let reader_name = name.clone();

        let mut tasks = JoinSet::new();
        tasks.spawn(launch.run(scope.clone()));
        tasks.spawn_blocking(move || {
            // Fires on return and on unwind from a panicking sink.
            let _drained = drained.drop_guard();
            drain_pipe(reader, &dispatch, chunk_size, &reader_name)
        });

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(ProcessError::TaskFailed {
                    command: name.clone(),
                    message: e.to_string(),
                })
            });

            if let Err(err) = outcome {
                scope.cancel();
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    debug!(process = %name, error = %err, "additional task error");
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Builds the tokio Command, with stdout and stderr both on `writer`.
    fn build_command(&self, writer: &PipeWriter) -> ProcessResult<Command> {
        let stdout = writer
            .try_clone()
            .map_err(|source| ProcessError::PipeFailed { source })?;
        let stderr = writer
            .try_clone()
            .map_err(|source| ProcessError::PipeFailed { source })?;

        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }
        command.envs(self.env_overrides());

        command.stdin(Stdio::null());
        command.stdout(stdout);
        command.stderr(stderr);

        // Kill on drop for safety
        command.kill_on_drop(true);

        #[cfg(unix)]
        if self.process_flags().contains(ProcessFlags::PROCESS_GROUP) {
            command.process_group(0);
        }

        #[cfg(windows)]
        command.creation_flags(super::windows::creation_flags(self.process_flags()));

        Ok(command)
    }
}

/// Fires the completion hook when `run` returns or its future is dropped.
struct CompleteOnDrop<'a>(Option<&'a dyn Lifecycle>);

impl Drop for CompleteOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(hook) = self.0 {
            hook.on_complete();
        }
    }
}

/// Everything the launcher task owns.
struct Launch {
    command: Command,
    writer: PipeWriter,
    name: String,
    cmd_line: String,
    group: bool,
    timeout: Option<Duration>,
    grace: Option<Duration>,
    /// Cancelled by the reader once it stops reading.
    drained: CancellationToken,
}

impl Launch {
    async fn run(self, scope: CancellationToken) -> ProcessResult<()> {
        let Self {
            mut command,
            writer,
            name,
            cmd_line,
            group,
            timeout,
            grace,
            drained,
        } = self;
        let deadline = timeout.map(|limit| Deadline {
            at: Instant::now() + limit,
            limit,
        });

        let spawned = command.spawn();
        // The command keeps its own copies of the write end; release them so
        // only the child and `writer` hold the pipe open.
        drop(command);

        let child = spawned.map_err(|source| ProcessError::SpawnFailed {
            command: cmd_line,
            source,
        })?;

        let mut supervised = Supervised::new(child, group, &name);
        let status = supervised.wait(&scope, deadline, grace, &name).await;

        // Closing the write end tells the reader the output is complete.
        drop(writer);
        let status = status?;

        // Descendants may still hold the pipe; the tree stays reachable until
        // the reader is done.
        let lingered = supervised.linger(&drained, &scope, deadline, &name).await;
        exit_result(status, &name).and(lingered)
    }
}

/// Absolute end of a run with a timeout.
#[derive(Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

fn sleep_until(deadline: Option<Deadline>) -> tokio::time::Sleep {
    tokio::time::sleep_until(deadline.map_or_else(Instant::now, |d| d.at))
}

fn exit_result(status: ExitStatus, name: &str) -> ProcessResult<()> {
    if !status.success() {
        return Err(ProcessError::NonZeroExit {
            command: name.to_string(),
            status,
        });
    }
    trace!(process = %name, status = %status, "completed");
    Ok(())
}

/// A spawned child plus whatever owns its process tree.
struct Supervised {
    child: Child,
    pid: Option<u32>,
    #[cfg(unix)]
    group: bool,
    #[cfg(windows)]
    job: Option<JobObject>,
}

impl Supervised {
    fn new(child: Child, group: bool, name: &str) -> Self {
        let pid = child.id();
        trace!(process = %name, pid = ?pid, "spawned");

        #[cfg(windows)]
        let job = if group {
            super::windows::setup_job_object(&child).unwrap_or_else(|e| {
                warn!(process = %name, error = %e, "running without job object");
                None
            })
        } else {
            None
        };

        #[cfg(not(any(unix, windows)))]
        let _ = group;

        Self {
            child,
            pid,
            #[cfg(unix)]
            group,
            #[cfg(windows)]
            job,
        }
    }

    /// Waits for the child to exit, terminating the tree on cancellation or
    /// timeout.
    async fn wait(
        &mut self,
        scope: &CancellationToken,
        deadline: Option<Deadline>,
        grace: Option<Duration>,
        name: &str,
    ) -> ProcessResult<ExitStatus> {
        tokio::select! {
            status = self.child.wait() => status.map_err(|source| ProcessError::WaitFailed {
                command: name.to_string(),
                source,
            }),
            () = scope.cancelled() => {
                warn!(process = %name, "Cancellation requested, terminating process");
                self.terminate(grace, name).await;
                Err(ProcessError::Cancelled { command: name.to_string() })
            }
            () = sleep_until(deadline), if deadline.is_some() => {
                let timeout = deadline.map_or_else(Duration::default, |d| d.limit);
                warn!(process = %name, timeout = ?timeout, "Process timed out");
                self.terminate(grace, name).await;
                Err(ProcessError::Timeout { command: name.to_string(), timeout })
            }
        }
    }

    /// After the child exited: waits for the reader to finish, killing what
    /// is left of the tree on cancellation or timeout.
    ///
    /// Only the group (Unix) or job (Windows) is signalled here; the child's
    /// own PID is already reaped and may be reused.
    async fn linger(
        &mut self,
        drained: &CancellationToken,
        scope: &CancellationToken,
        deadline: Option<Deadline>,
        name: &str,
    ) -> ProcessResult<()> {
        tokio::select! {
            biased;
            () = drained.cancelled() => Ok(()),
            () = scope.cancelled() => {
                warn!(process = %name, "Cancellation requested, killing remaining processes");
                self.kill(name).await;
                Err(ProcessError::Cancelled { command: name.to_string() })
            }
            () = sleep_until(deadline), if deadline.is_some() => {
                let timeout = deadline.map_or_else(Duration::default, |d| d.limit);
                warn!(process = %name, timeout = ?timeout, "Remaining processes timed out");
                self.kill(name).await;
                Err(ProcessError::Timeout { command: name.to_string(), timeout })
            }
        }
    }

    /// Stops the process tree: polite request first when a grace period is
    /// set, then a kill.
    async fn terminate(&mut self, grace: Option<Duration>, name: &str) {
        if let (Some(grace), Some(pid)) = (grace, self.pid) {
            match self.request_stop(pid) {
                Ok(()) => {
                    if tokio::time::timeout(grace, self.child.wait()).await.is_ok() {
                        trace!(process = %name, "stopped within grace period");
                    } else {
                        debug!(process = %name, grace = ?grace, "grace period elapsed, will force kill");
                    }
                }
                Err(e) => debug!(process = %name, error = %e, "stop request failed, will force kill"),
            }
        }
        self.kill(name).await;
    }

    #[cfg(unix)]
    fn request_stop(&self, pid: u32) -> std::io::Result<()> {
        super::unix::signal_tree(pid, self.group, nix::sys::signal::Signal::SIGTERM)
    }

    #[cfg(windows)]
    fn request_stop(&self, pid: u32) -> std::io::Result<()> {
        super::windows::send_ctrl_break(pid)
    }

    #[cfg(not(any(unix, windows)))]
    fn request_stop(&self, _pid: u32) -> std::io::Result<()> {
        Err(std::io::Error::from(std::io::ErrorKind::Unsupported))
    }

    /// Kills the tree and reaps the child.
    async fn kill(&mut self, name: &str) {
        #[cfg(unix)]
        if self.group
            && let Some(pid) = self.pid
            && let Err(e) =
                super::unix::signal_tree(pid, true, nix::sys::signal::Signal::SIGKILL)
        {
            trace!(process = %name, error = %e, "process group already gone");
        }

        #[cfg(windows)]
        if let Some(job) = &self.job
            && let Err(e) = job.terminate(1)
        {
            debug!(process = %name, error = %e, "failed to terminate job");
        }

        // Fails only if the child was already reaped
        if let Err(e) = self.child.kill().await {
            trace!(process = %name, error = %e, "kill after exit");
        }
    }
}
