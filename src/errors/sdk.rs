// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Failure taxonomy for calls across the engine SDK boundary.

use std::fmt;
use thiserror::Error;

/// Typed failure returned by every engine SDK call.
///
/// The variants drive how callers react: bad input is counted and skipped,
/// retryable failures are counted and queued for replay, replace conflicts are
/// retried in place, and everything else aborts the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SzError {
    /// The record, criteria or definition handed to the engine is malformed.
    #[error("Bad input: {0}")]
    BadInput(String),

    /// A transient condition; the same call may succeed later.
    #[error("Retryable failure: {0}")]
    Retryable(String),

    /// The referenced record, entity or configuration does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The default configuration changed between read and replace.
    #[error("Default configuration replace conflict: {0}")]
    ReplaceConflict(String),

    /// The settings or repository configuration are unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any other engine failure.
    #[error("Unrecoverable engine failure: {0}")]
    Unrecoverable(String),
}

impl SzError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SzError::Retryable(_))
    }

    /// Label used when logging a failed record or redo.
    pub fn severity(&self) -> Severity {
        match self {
            SzError::BadInput(_) | SzError::NotFound(_) => Severity::Error,
            SzError::Retryable(_) => Severity::Warning,
            SzError::ReplaceConflict(_)
            | SzError::Configuration(_)
            | SzError::Unrecoverable(_) => Severity::Critical,
        }
    }
}

/// How serious a failed engine call is for the surrounding workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_taxonomy() {
        assert_eq!(SzError::BadInput("x".into()).severity(), Severity::Error);
        assert_eq!(SzError::Retryable("x".into()).severity(), Severity::Warning);
        assert_eq!(SzError::Unrecoverable("x".into()).severity(), Severity::Critical);
        assert!(SzError::Retryable("busy".into()).is_retryable());
        assert!(!SzError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}
