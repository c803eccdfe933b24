// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Unix-specific process utilities.
//!
//! ```text
//! spawn: process_group(0)  --> pgid == child pid
//! signal_tree(pid, group, SIGTERM | SIGKILL)
//!   group  --> killpg(pgid)   reaches grandchildren holding the pipe
//!   single --> kill(pid)
//! ```

use nix::sys::signal::{Signal, kill, killpg};
use nix::unistd::Pid;
use std::io;

/// Sends `signal` to the child or to its whole process group.
///
/// # Errors
///
/// Returns an error if the PID is out of range or the signal cannot be
/// delivered (`ESRCH` once everything has exited).
pub(super) fn signal_tree(pid: u32, group: bool, signal: Signal) -> io::Result<()> {
    let raw = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid PID {pid}")))?;
    let pid = Pid::from_raw(raw);

    let sent = if group {
        killpg(pid, signal)
    } else {
        kill(pid, signal)
    };
    sent.map_err(io::Error::from)
}
