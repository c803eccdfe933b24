// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Caller-side capabilities consumed by the runner.
//!
//! ```text
//! OutputSink::write(&[u8])   reader thread, zero or more times, in order
//! Lifecycle::on_complete()   caller task, exactly once per run
//!
//! OutputMode::Chunks  "a\nb" "c\n"  --> "a\nb", "c\n"
//! OutputMode::Lines   "a\nb" "c\n"  --> "a\n", "b", "c\n"
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Receives the child's combined stdout/stderr as it is produced.
///
/// Called from the runner's reader thread, never concurrently for a single
/// run. Sinks shared between runs must synchronize their own state.
pub trait OutputSink: Send + Sync {
    fn write(&self, chunk: &[u8]);
}

impl<F> OutputSink for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn write(&self, chunk: &[u8]) {
        self(chunk);
    }
}

/// Cleanup hook notified once a run has fully ended, whatever the outcome.
pub trait Lifecycle: Send + Sync {
    fn on_complete(&self);
}

impl<F> Lifecycle for F
where
    F: Fn() + Send + Sync,
{
    fn on_complete(&self) {
        self();
    }
}

/// How read chunks are handed to the [`OutputSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Forward each read as-is.
    #[default]
    Chunks,
    /// Split each read after every newline. Partial lines at the end of a
    /// read are forwarded without waiting for the rest.
    Lines,
}

/// Routes reads from the pipe to the configured sink.
#[derive(Clone)]
pub(super) struct OutputDispatch {
    sink: Option<Arc<dyn OutputSink>>,
    mode: OutputMode,
}

impl OutputDispatch {
    pub(super) fn new(sink: Option<Arc<dyn OutputSink>>, mode: OutputMode) -> Self {
        Self { sink, mode }
    }

    pub(super) fn deliver(&self, chunk: &[u8]) {
        let Some(sink) = &self.sink else {
            return;
        };
        match self.mode {
            OutputMode::Chunks => sink.write(chunk),
            OutputMode::Lines => {
                for line in chunk.split_inclusive(|&b| b == b'\n') {
                    sink.write(line);
                }
            }
        }
    }
}
