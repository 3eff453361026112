// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic events are modelled as message structs with a `Display`
//! implementation and a [`messages::StructuredLog`] implementation, so the
//! human-readable text and the structured fields are defined in one place.
//!
//! Messages are organized by subsystem:
//! * `messages::runner` - snippet preparation and execution lifecycle
//! * `messages::repository` - temporary repository bootstrap
//! * `messages::install` - installation directory discovery
//! * `messages::workload` - record loading and redo processing
//!
//! # Usage
//!
//! ```rust
//! use snippet_runner::observability::messages::StructuredLog;
//! use snippet_runner::observability::messages::runner::SnippetExecuting;
//!
//! SnippetExecuting {
//!     snippet: "loading.load_records",
//!     program: "cargo",
//! }
//! .log();
//! ```

pub mod messages;

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` controls filtering (default `warn`); output goes to stderr so the
/// runner transcript on stdout stays readable.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // A second initialisation (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
