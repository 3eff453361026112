// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for the snippet catalog, CLI selection and run coordination.

use crate::errors::SzError;
use crate::runner::RunPhase;
use std::path::PathBuf;
use thiserror::Error;

/// The snippets directory could not be located.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Must be run from the repository root, runner or snippets directory (looked from {cwd})")]
    WrongDirectory { cwd: PathBuf },

    #[error("Snippets directory does not exist: {0}")]
    MissingSnippetsDir(PathBuf),
}

/// A CLI token matched neither `all`, a group nor a snippet.
#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("Unrecognized code snippet or snippet group: {0}")]
    Unrecognized(String),
}

/// Problems reading a snippet property file.
#[derive(Error, Debug)]
pub enum PropertiesError {
    #[error("Failed to read property file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid destroyAfter value '{value}': expected milliseconds")]
    InvalidDestroyAfter { value: String },
}

/// Failures while preparing or executing a single snippet.
///
/// Any of these aborts the remainder of the run.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("{snippet} failed while {phase}: {source}")]
    Engine {
        snippet: String,
        phase: RunPhase,
        #[source]
        source: SzError,
    },

    #[error(transparent)]
    Properties(#[from] PropertiesError),

    #[error("Missing resource ({file}) for load file ({key}) for snippet ({snippet})")]
    MissingLoadFile {
        snippet: String,
        key: String,
        file: PathBuf,
    },

    #[error("Failed to read load file {file}: {source}")]
    LoadFileRead {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse line {line_number} of {file} as a JSON object: {line}")]
    MalformedRecord {
        file: PathBuf,
        line_number: usize,
        line: String,
    },

    #[error("Failed to launch snippet {snippet}: {source}")]
    Launch {
        snippet: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to feed input to snippet {snippet}: {source}")]
    Input {
        snippet: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Launch command template is empty")]
    EmptyLaunchCommand,

    #[error("Failed to execute snippet; {snippet} ({actual}, expected {expected})")]
    UnexpectedExitCode {
        snippet: String,
        expected: i32,
        actual: i32,
    },

    #[error("Background task for {snippet} did not complete: {message}")]
    Task { snippet: String, message: String },
}

/// A critical failure that stops a demo workload.
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Critical failure at line {line_number}: {source}")]
    Critical {
        line_number: usize,
        #[source]
        source: SzError,
    },

    #[error("Critical failure processing redo record: {0}")]
    CriticalRedo(#[source] SzError),

    #[error("Failed reading input: {0}")]
    Input(#[source] std::io::Error),

    #[error("Failed writing retry file: {0}")]
    RetryFile(#[source] std::io::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}
