// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for installation directory discovery.

use crate::install::InstallLocations;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Discovery finished.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct LocationsResolved<'a> {
    pub locations: &'a InstallLocations,
}

impl Display for LocationsResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Resolved installation locations:{}", self.locations)
    }
}

impl StructuredLog for LocationsResolved<'_> {
    fn log(&self) {
        tracing::debug!(
            install = %self.locations.install_dir().display(),
            support = %self.locations.support_dir().display(),
            development_build = self.locations.is_development_build(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "install_locations",
            span_name = name,
            install = %self.locations.install_dir().display(),
        )
    }
}

/// An implicitly derived directory was discarded.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ImplicitPathDiscarded<'a> {
    pub kind: &'static str,
    pub path: &'a Path,
}

impl Display for ImplicitPathDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarding implicit {} directory {}",
            self.kind,
            self.path.display()
        )
    }
}

impl StructuredLog for ImplicitPathDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("discard", span_name = name, kind = self.kind)
    }
}
