// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! Runs an external program, streams its combined stdout/stderr to a caller
//! supplied sink while it runs, and tears it down when the caller cancels.
//!
//! # Crate Architecture
//!
//! ```text
//!              caller
//!     ProcessRunner::new(..).run(&token)
//!                 |
//!                 v
//!   ,----------------------------------,
//!   |          core::process           |
//!   |  launcher task    reader task    |
//!   |  (child, wait)    (pipe, sink)   |
//!   '----------------+-----------------'
//!                    |
//!              core::job (Windows)
//!
//!   +------------------------------------+
//!   |  foundation  config, error, logging |
//!   +------------------------------------+
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use crate::core::process::{
    Lifecycle, OutputMode, OutputSink, ProcessFlags, ProcessRunner,
};
pub use crate::error::{ProcessError, ProcessResult};
