// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the temporary repository bootstrap.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// The schema script was applied to a fresh database file.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SchemaApplied<'a> {
    pub database: &'a Path,
    pub statements: usize,
}

impl Display for SchemaApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Applied {} schema statements to {}",
            self.statements,
            self.database.display()
        )
    }
}

impl StructuredLog for SchemaApplied<'_> {
    fn log(&self) {
        tracing::info!(
            database = %self.database.display(),
            statements = self.statements,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "schema",
            span_name = name,
            database = %self.database.display(),
        )
    }
}

/// The baseline configuration was registered as the default.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DefaultConfigRegistered {
    pub config_id: i64,
}

impl Display for DefaultConfigRegistered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered default configuration {}", self.config_id)
    }
}

impl StructuredLog for DefaultConfigRegistered {
    fn log(&self) {
        tracing::info!(config_id = self.config_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("default_config", span_name = name, config_id = self.config_id)
    }
}

/// The temporary database could not be removed at the end of the run.
///
/// # Log Level
/// `warn!` - Unexpected but non-fatal
pub struct TempRepositoryCleanupFailed<'a> {
    pub database: &'a Path,
    pub error: &'a std::io::Error,
}

impl Display for TempRepositoryCleanupFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to remove temporary repository {}: {}",
            self.database.display(),
            self.error
        )
    }
}

impl StructuredLog for TempRepositoryCleanupFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            database = %self.database.display(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "cleanup",
            span_name = name,
            database = %self.database.display(),
        )
    }
}
