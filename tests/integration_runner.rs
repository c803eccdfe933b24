// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the process runner.
//!
//! Drives real child processes through the public API.

#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use procstream::{Lifecycle, OutputMode, OutputSink, ProcessError, ProcessRunner};
use tokio_util::sync::CancellationToken;

/// Sink that records output as a string.
#[derive(Default)]
struct Transcript {
    text: Mutex<String>,
    writes: AtomicUsize,
}

impl OutputSink for Transcript {
    fn write(&self, chunk: &[u8]) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.text
            .lock()
            .unwrap()
            .push_str(&String::from_utf8_lossy(chunk));
    }
}

/// Hook that counts completions.
#[derive(Default)]
struct Completions(AtomicUsize);

impl Lifecycle for Completions {
    fn on_complete(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lets a test keep a handle on a sink or hook it gives to the runner.
struct Shared<T>(Arc<T>);

impl<T: OutputSink> OutputSink for Shared<T> {
    fn write(&self, chunk: &[u8]) {
        self.0.write(chunk);
    }
}

impl<T: Lifecycle> Lifecycle for Shared<T> {
    fn on_complete(&self) {
        self.0.on_complete();
    }
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn runner_streams_combined_output() {
    let transcript = Arc::new(Transcript::default());
    let completions = Arc::new(Completions::default());

    ProcessRunner::new("sh")
        .args(["-c", "echo building; echo warning >&2; echo finished"])
        .on_output(Shared(Arc::clone(&transcript)))
        .on_complete(Shared(Arc::clone(&completions)))
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let text = transcript.text.lock().unwrap().clone();
    insta::assert_snapshot!(text, @r"
    building
    warning
    finished
    ");
    assert_eq!(completions.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn runner_line_mode_one_write_per_line() {
    let transcript = Arc::new(Transcript::default());

    ProcessRunner::new("printf")
        .arg("one\\ntwo\\nthree\\n")
        .output_mode(OutputMode::Lines)
        .read_buffer_size(4096)
        .on_output(Shared(Arc::clone(&transcript)))
        .run(&CancellationToken::new())
        .await
        .unwrap();

    // A single small write arrives in one read, so it splits into three lines.
    assert_eq!(*transcript.text.lock().unwrap(), "one\ntwo\nthree\n");
    assert_eq!(transcript.writes.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn runner_streams_while_running() {
    let transcript = Arc::new(Transcript::default());
    let first_seen = Arc::new(Mutex::new(None));
    let started = Instant::now();

    let seen = Arc::clone(&first_seen);
    let inner = Arc::clone(&transcript);
    ProcessRunner::new("sh")
        .args(["-c", "echo early; sleep 1; echo late"])
        .on_output(move |chunk: &[u8]| {
            seen.lock().unwrap().get_or_insert_with(|| started.elapsed());
            inner.write(chunk);
        })
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let first = first_seen.lock().unwrap().expect("output was delivered");
    assert!(first < Duration::from_millis(900), "first chunk after {first:?}");
    assert_eq!(*transcript.text.lock().unwrap(), "early\nlate\n");
}

// =============================================================================
// Failure and cancellation
// =============================================================================

#[tokio::test]
async fn runner_reports_exit_code_after_output() {
    let transcript = Arc::new(Transcript::default());

    let err = ProcessRunner::new("sh")
        .args(["-c", "echo failing; exit 3"])
        .name("failing-step")
        .on_output(Shared(Arc::clone(&transcript)))
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(3));
    insta::assert_snapshot!(err.to_string(), @"process 'failing-step' exited with exit status: 3");
    assert_eq!(*transcript.text.lock().unwrap(), "failing\n");
}

#[tokio::test]
async fn runner_cancel_through_parent_token() {
    let parent = CancellationToken::new();
    let completions = Arc::new(Completions::default());

    let canceller = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = ProcessRunner::new("sh")
        .args(["-c", "while true; do echo tick; sleep 0.1; done"])
        .on_complete(Shared(Arc::clone(&completions)))
        .run(&parent)
        .await
        .unwrap_err();

    assert!(matches!(err, ProcessError::Cancelled { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(completions.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn runner_failure_does_not_cancel_caller_token() {
    let token = CancellationToken::new();

    let err = ProcessRunner::new("false").run(&token).await.unwrap_err();

    assert!(!err.is_cancelled());
    assert!(!token.is_cancelled(), "only the run's own scope is cancelled");
}

#[tokio::test]
async fn runner_concurrent_runs_share_sink() {
    let transcript = Arc::new(Transcript::default());
    let token = CancellationToken::new();

    let a = ProcessRunner::new("echo")
        .arg("a")
        .on_output(Shared(Arc::clone(&transcript)));
    let b = ProcessRunner::new("echo")
        .arg("b")
        .on_output(Shared(Arc::clone(&transcript)));

    let (ra, rb) = tokio::join!(a.run(&token), b.run(&token));
    ra.unwrap();
    rb.unwrap();

    let mut lines: Vec<String> = transcript
        .text
        .lock()
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    lines.sort();
    assert_eq!(lines, ["a", "b"]);
}
