// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output pipe and reader task.
//!
//! ```text
//! open_pipe() --> (PipeReader, PipeWriter)
//!
//!  child stdout --+
//!                 +--> PipeWriter ==pipe==> PipeReader --> drain_pipe()
//!  child stderr --+                                        read(chunk)
//!                                                          OutputDispatch
//!                                                          Ok(0) = done
//! ```
//!
//! The reader runs on the blocking pool. It unblocks once every copy of the
//! write end is closed: the launcher's after reaping the child, the child's
//! when it (and its process group) exits.

use std::io::{ErrorKind, PipeReader, PipeWriter, Read};
use tracing::{debug, trace};

use super::sink::OutputDispatch;
use crate::error::{ProcessError, ProcessResult};

/// Creates the pipe that carries the child's combined output.
pub(super) fn open_pipe() -> ProcessResult<(PipeReader, PipeWriter)> {
    std::io::pipe().map_err(|source| ProcessError::PipeFailed { source })
}

/// Reads the pipe to end-of-stream, forwarding every chunk.
pub(super) fn drain_pipe(
    mut reader: PipeReader,
    dispatch: &OutputDispatch,
    chunk_size: usize,
    process_name: &str,
) -> ProcessResult<()> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0usize;

    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                trace!(process = %process_name, bytes = total, "output closed");
                return Ok(());
            }
            Ok(n) => {
                total += n;
                trace!(process = %process_name, bytes = n, "output");
                dispatch.deliver(&buf[..n]);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(source) => {
                debug!(process = %process_name, error = %source, "error reading output");
                return Err(ProcessError::OutputFailed {
                    command: process_name.to_string(),
                    source,
                });
            }
        }
    }
}
