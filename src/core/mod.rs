// procstream: Cancellable subprocess streaming
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core modules for process execution.
//!
//! ```text
//!          core
//!           |
//!     +-----+-----+
//!     |           |
//!     v           v
//!  process       job
//!  Runner      JobObject
//!  Sink        KILL_ON_CLOSE
//!  Lifecycle   (Windows only)
//! ```

pub mod process;

#[cfg(windows)]
pub mod job;
