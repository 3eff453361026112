// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for record loading and redo processing.

use crate::errors::{Severity, SzError};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// An input record could not be added.
///
/// # Log Level
/// Follows the failure's severity: `error!` for critical failures and bad
/// input, `warn!` for retryable ones.
pub struct RecordFailed<'a> {
    pub severity: Severity,
    pub line_number: usize,
    pub record: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RecordFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "** {} ** FAILED TO ADD RECORD AT LINE {}: {} ({})",
            self.severity, self.line_number, self.record, self.error
        )
    }
}

impl StructuredLog for RecordFailed<'_> {
    fn log(&self) {
        match self.severity {
            Severity::Warning => tracing::warn!(
                severity = %self.severity,
                line_number = self.line_number,
                error = %self.error,
                "{}", self
            ),
            Severity::Error | Severity::Critical => tracing::error!(
                severity = %self.severity,
                line_number = self.line_number,
                error = %self.error,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "record_failed",
            span_name = name,
            line_number = self.line_number,
        )
    }
}

/// A redo record could not be processed.
///
/// # Log Level
/// `warn!` for retryable failures, `error!` otherwise
pub struct RedoFailed<'a> {
    pub redo: &'a str,
    pub error: &'a SzError,
}

impl Display for RedoFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "** {} ** FAILED TO PROCESS REDO: {} ({})",
            self.error.severity(),
            self.redo,
            self.error
        )
    }
}

impl StructuredLog for RedoFailed<'_> {
    fn log(&self) {
        if self.error.is_retryable() {
            tracing::warn!(error = %self.error, "{}", self);
        } else {
            tracing::error!(error = %self.error, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("redo_failed", span_name = name)
    }
}

/// A retry file was opened for the first retryable failure.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RetryFileOpened<'a> {
    pub path: &'a Path,
}

impl Display for RetryFileOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Tracking retry records in {}", self.path.display())
    }
}

impl StructuredLog for RetryFileOpened<'_> {
    fn log(&self) {
        tracing::info!(path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("retry_file", span_name = name, path = %self.path.display())
    }
}

/// No redo records were available.
///
/// # Log Level
/// `debug!` - Polling detail
pub struct RedoQueueIdle {
    pub idle_polls: usize,
}

impl Display for RedoQueueIdle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No redo records to process (idle poll {})", self.idle_polls)
    }
}

impl StructuredLog for RedoQueueIdle {
    fn log(&self) {
        tracing::debug!(idle_polls = self.idle_polls, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("redo_idle", span_name = name)
    }
}
