// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SzError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while laying down the temporary repository.
///
/// All of them are fatal for the run; bootstrapping is never retried.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Required {name} directory is missing from the installation")]
    MissingDirectory { name: &'static str },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create temporary database: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Schema statement failed ({statement}): {source}")]
    Schema {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to open temporary database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("Failed to serialize settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("Failed to register the default configuration: {0}")]
    Sdk(#[from] SzError),
}
