// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Windows-specific process utilities.
//!
//! ```text
//! creation_flags(flags) --> CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW
//! send_ctrl_break(pid)  --> CTRL_BREAK_EVENT
//! setup_job_object(child) --> JobObject(KILL_ON_JOB_CLOSE)
//! cancellation: ctrl_break -> grace period -> terminate job -> kill
//! ```

use std::io;
use tokio::process::Child;
use windows::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, CREATE_NO_WINDOW};

use super::builder::ProcessFlags;
use crate::core::job::JobObject;
use crate::error::JobError;

/// Maps runner flags to `CreateProcess` creation flags.
pub(super) fn creation_flags(flags: ProcessFlags) -> u32 {
    let mut creation = 0;
    if flags.contains(ProcessFlags::PROCESS_GROUP) {
        creation |= CREATE_NEW_PROCESS_GROUP.0;
    }
    if flags.contains(ProcessFlags::HIDE_WINDOW) {
        creation |= CREATE_NO_WINDOW.0;
    }
    creation
}

/// Sends CTRL+BREAK to a process group on Windows.
///
/// # Errors
///
/// Returns an error if `GenerateConsoleCtrlEvent` fails, e.g. when the child
/// has no console attached.
pub(super) fn send_ctrl_break(pid: u32) -> io::Result<()> {
    use windows::Win32::System::Console::CTRL_BREAK_EVENT;
    use windows::Win32::System::Console::GenerateConsoleCtrlEvent;

    // SAFETY: GenerateConsoleCtrlEvent is safe to call with a valid process group ID
    unsafe {
        GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid)
            .map_err(|e: windows::core::Error| io::Error::from_raw_os_error(e.code().0))
    }
}

/// Places the child in a Job Object that kills its tree when closed.
///
/// Returns `None` if the child has already been reaped.
pub(super) fn setup_job_object(child: &Child) -> Result<Option<JobObject>, JobError> {
    let (Some(pid), Some(handle)) = (child.id(), child.raw_handle()) else {
        return Ok(None);
    };
    let job = JobObject::new()?;
    job.assign(handle, pid)?;
    Ok(Some(job))
}
