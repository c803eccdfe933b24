// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Async process spawning with streamed, cancellable output capture.
//!
//! ```text
//! ProcessRunner::new("cmake")
//!   .args() .cwd() .env() .on_output() .on_complete()
//!   .run(&token)
//!       --> tokio::process::Command
//!           stdout + stderr --> one pipe --> OutputSink
//!           cancel: process group (Unix) / Job Object (Windows)
//!       --> Ok(()) | ProcessError
//! ```

pub mod builder;
mod io;
mod runner;
pub mod sink;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use builder::{DEFAULT_READ_BUFFER_SIZE, ProcessFlags, ProcessRunner};
pub use sink::{Lifecycle, OutputMode, OutputSink};
