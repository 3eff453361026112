// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the per-snippet run lifecycle.
//!
//! This module contains message types for logging events related to:
//! * Phase transitions (preparing, configuring, loading, executing)
//! * Child process launch and termination
//! * Snippet completion and failure

use crate::observability::messages::StructuredLog;
use crate::runner::RunPhase;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A snippet moved into a new phase.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct PhaseEntered<'a> {
    pub snippet: &'a str,
    pub phase: RunPhase,
}

impl Display for PhaseEntered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} entered phase {}", self.snippet, self.phase)
    }
}

impl StructuredLog for PhaseEntered<'_> {
    fn log(&self) {
        tracing::debug!(
            snippet = self.snippet,
            phase = %self.phase,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "phase",
            span_name = name,
            snippet = self.snippet,
            phase = %self.phase,
        )
    }
}

/// A snippet run is starting.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use snippet_runner::observability::messages::runner::SnippetRunStarted;
///
/// let msg = SnippetRunStarted {
///     snippet: "loading.load_records",
///     sources: 2,
///     loads: 1,
///     inputs: 0,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct SnippetRunStarted<'a> {
    pub snippet: &'a str,
    pub sources: usize,
    pub loads: usize,
    pub inputs: usize,
}

impl Display for SnippetRunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running {}: {} data sources, {} load files, {} input lines",
            self.snippet, self.sources, self.loads, self.inputs
        )
    }
}

impl StructuredLog for SnippetRunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            snippet = self.snippet,
            sources = self.sources,
            loads = self.loads,
            inputs = self.inputs,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "snippet_run",
            span_name = name,
            snippet = self.snippet,
        )
    }
}

/// Records were preloaded from a load file.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RecordsPreloaded<'a> {
    pub snippet: &'a str,
    pub file: &'a str,
    pub count: usize,
}

impl Display for RecordsPreloaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Preloaded {} records from {} for {}",
            self.count, self.file, self.snippet
        )
    }
}

impl StructuredLog for RecordsPreloaded<'_> {
    fn log(&self) {
        tracing::info!(
            snippet = self.snippet,
            file = self.file,
            count = self.count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "preload",
            span_name = name,
            snippet = self.snippet,
            file = self.file,
        )
    }
}

/// The snippet child process was spawned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SnippetExecuting<'a> {
    pub snippet: &'a str,
    pub program: &'a str,
}

impl Display for SnippetExecuting<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Launching {} via {}", self.snippet, self.program)
    }
}

impl StructuredLog for SnippetExecuting<'_> {
    fn log(&self) {
        tracing::info!(
            snippet = self.snippet,
            program = self.program,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execute",
            span_name = name,
            snippet = self.snippet,
            program = self.program,
        )
    }
}

/// Termination of a snippet was requested.
///
/// # Log Level
/// `warn!` - The graceful request was ignored and the process is force-killed
/// `info!` - Otherwise
pub struct TerminationRequested {
    pub pid: Option<u32>,
    pub forced: bool,
}

impl Display for TerminationRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let pid = self
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        if self.forced {
            write!(f, "Force-killing process group {}", pid)
        } else {
            write!(f, "Requesting graceful termination of process group {}", pid)
        }
    }
}

impl StructuredLog for TerminationRequested {
    fn log(&self) {
        if self.forced {
            tracing::warn!(pid = ?self.pid, forced = self.forced, "{}", self);
        } else {
            tracing::info!(pid = ?self.pid, forced = self.forced, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("terminate", span_name = name, pid = ?self.pid)
    }
}

/// A snippet finished with the expected exit code.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SnippetCompleted<'a> {
    pub snippet: &'a str,
    pub exit_code: i32,
    pub terminated: bool,
    pub duration: Duration,
}

impl Display for SnippetCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} completed with exit code {} in {:?}{}",
            self.snippet,
            self.exit_code,
            self.duration,
            if self.terminated { " (terminated)" } else { "" }
        )
    }
}

impl StructuredLog for SnippetCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            snippet = self.snippet,
            exit_code = self.exit_code,
            terminated = self.terminated,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "completed",
            span_name = name,
            snippet = self.snippet,
            exit_code = self.exit_code,
        )
    }
}

/// A snippet failed and the run is being aborted.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct SnippetFailed<'a> {
    pub snippet: &'a str,
    pub phase: RunPhase,
    pub error: &'a dyn std::error::Error,
}

impl Display for SnippetFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} failed while {}: {}",
            self.snippet, self.phase, self.error
        )
    }
}

impl StructuredLog for SnippetFailed<'_> {
    fn log(&self) {
        tracing::error!(
            snippet = self.snippet,
            phase = %self.phase,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "failed",
            span_name = name,
            snippet = self.snippet,
            phase = %self.phase,
        )
    }
}
