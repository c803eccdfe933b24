// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::os::windows::io::AsRawHandle;
use std::process::{Command, Stdio};

use super::JobObject;

fn long_running() -> std::process::Child {
    Command::new("ping")
        .args(["-n", "30", "127.0.0.1"])
        .stdout(Stdio::null())
        .spawn()
        .expect("ping should start")
}

#[test]
fn test_new_job_is_empty() {
    let job = JobObject::new().expect("JobObject creation should succeed");
    assert_eq!(job.active_processes(), Some(0));
    assert!(job.terminate(1).is_ok(), "terminating an empty job should succeed");
}

#[test]
fn test_terminate_kills_assigned_process() {
    let job = JobObject::new().expect("JobObject creation should succeed");
    let mut child = long_running();

    job.assign(child.as_raw_handle(), child.id())
        .expect("assignment should succeed");
    assert_eq!(job.active_processes(), Some(1));

    job.terminate(7).expect("terminate should succeed");
    let status = child.wait().expect("wait should succeed");
    assert_eq!(status.code(), Some(7));
}

#[test]
fn test_drop_kills_assigned_process() {
    let mut child = long_running();
    {
        let job = JobObject::new().expect("JobObject creation should succeed");
        job.assign(child.as_raw_handle(), child.id())
            .expect("assignment should succeed");
    }
    let status = child.wait().expect("wait should succeed");
    assert!(!status.success());
}
