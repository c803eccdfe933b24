// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Windows Job Object owning a child's process tree.
//!
//! ```text
//! JobObject::new()      KILL_ON_JOB_CLOSE
//!   assign(handle, pid) child joins; its descendants follow
//!   terminate(code)     cancellation
//!   drop                handle closed, whatever is left is killed
//! ```
//!
//! Windows has no process groups in the Unix sense; the job is what lets a
//! cancelled run take down grandchildren that still hold the output pipe.

use std::io;
use std::mem::size_of;
use std::os::windows::io::RawHandle;

use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
    JOBOBJECT_EXTENDED_LIMIT_INFORMATION, JobObjectExtendedLimitInformation,
    SetInformationJobObject, TerminateJobObject,
};
use windows::core::Owned;

use crate::error::JobError;

fn os_error(err: &windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(err.code().0)
}

/// Job Object that kills every assigned process when it is closed.
pub struct JobObject {
    handle: Owned<HANDLE>,
}

// SAFETY: a job handle is a kernel object reference; the Win32 job functions
// may be called on it from any thread.
unsafe impl Send for JobObject {}
unsafe impl Sync for JobObject {}

impl JobObject {
    /// Creates an anonymous job with `JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE`.
    ///
    /// # Errors
    ///
    /// Returns `CreateFailed` or `ConfigureFailed` from the Win32 calls.
    pub fn new() -> Result<Self, JobError> {
        // SAFETY: no security attributes and no name; the returned handle is
        // owned from here on.
        let handle = unsafe {
            Owned::new(
                CreateJobObjectW(None, None).map_err(|e| JobError::CreateFailed(os_error(&e)))?,
            )
        };

        let mut limits = JOBOBJECT_EXTENDED_LIMIT_INFORMATION::default();
        limits.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;
        let len = u32::try_from(size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>())
            .unwrap_or(u32::MAX);

        // SAFETY: `limits` lives across the call and `len` is its size.
        unsafe {
            SetInformationJobObject(
                *handle,
                JobObjectExtendedLimitInformation,
                (&raw const limits).cast(),
                len,
            )
        }
        .map_err(|e| JobError::ConfigureFailed(os_error(&e)))?;

        Ok(Self { handle })
    }

    /// Adds a running process to the job.
    ///
    /// `process` must be a live process handle owned by the caller; it is
    /// only borrowed for the call.
    ///
    /// # Errors
    ///
    /// Returns `AssignFailed` if Windows refuses the assignment.
    pub fn assign(&self, process: RawHandle, pid: u32) -> Result<(), JobError> {
        // SAFETY: both handles are valid for the duration of the call.
        unsafe { AssignProcessToJobObject(*self.handle, HANDLE(process)) }.map_err(|e| {
            JobError::AssignFailed {
                pid,
                source: os_error(&e),
            }
        })
    }

    /// Kills every process in the job with `exit_code`.
    ///
    /// # Errors
    ///
    /// Returns `TerminateFailed` from `TerminateJobObject`.
    pub fn terminate(&self, exit_code: u32) -> Result<(), JobError> {
        // SAFETY: the job handle is owned by `self`.
        unsafe { TerminateJobObject(*self.handle, exit_code) }
            .map_err(|e| JobError::TerminateFailed(os_error(&e)))
    }

    /// Number of processes currently in the job.
    #[cfg(test)]
    pub(crate) fn active_processes(&self) -> Option<u32> {
        use windows::Win32::System::JobObjects::{
            JOBOBJECT_BASIC_ACCOUNTING_INFORMATION, JobObjectBasicAccountingInformation,
            QueryInformationJobObject,
        };

        let mut info = JOBOBJECT_BASIC_ACCOUNTING_INFORMATION::default();
        let len = u32::try_from(size_of::<JOBOBJECT_BASIC_ACCOUNTING_INFORMATION>())
            .unwrap_or(u32::MAX);

        // SAFETY: `info` lives across the call and `len` is its size.
        unsafe {
            QueryInformationJobObject(
                Some(*self.handle),
                JobObjectBasicAccountingInformation,
                (&raw mut info).cast(),
                len,
                None,
            )
        }
        .ok()?;
        Some(info.ActiveProcesses)
    }
}

#[cfg(test)]
mod tests;
