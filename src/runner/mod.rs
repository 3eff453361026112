// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential execution of selected snippets.
//!
//! Each snippet goes through the same lifecycle:
//!
//! ```text
//! Preparing -> Configuring -> Loading -> Executing -> Completed
//!      \            \             \           \
//!       +------------+-------------+-----------+--> Failed
//! ```
//!
//! Preparation talks to the engine on a blocking task through a fresh
//! environment that is dropped before the snippet starts, so the snippet has
//! the repository to itself. Any failure ends the whole run.

mod coordinator;
mod integration_tests;
mod prepare;
mod process;
mod termination;

pub use coordinator::{RunCoordinator, RunReport, RunResult};
pub use prepare::{prepare_repository, PreparationPlan};
pub use process::ProcessExecutor;
pub use termination::{exit_code, Termination};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Preparing,
    Configuring,
    Loading,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Preparing => "preparing",
            RunPhase::Configuring => "configuring",
            RunPhase::Loading => "loading",
            RunPhase::Executing => "executing",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}
