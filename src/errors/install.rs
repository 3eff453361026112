// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering the engine installation directories.
///
/// Every variant names the offending path and the environment variable that
/// controls it so the diagnostic tells the user what to change.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Could not find installation directory: {path} ({hint})")]
    InstallDirNotFound { path: PathBuf, hint: String },

    #[error("Installation directory appears invalid: {path} ({hint})")]
    InstallDirInvalid { path: PathBuf, hint: String },

    #[error("The support directory does not exist: {path} ({hint})")]
    SupportDirNotFound { path: PathBuf, hint: String },

    #[error("The support directory is invalid: {path} ({hint})")]
    SupportDirInvalid { path: PathBuf, hint: String },

    #[error("{variable} specifies a config path that does not exist: {path}")]
    ConfigDirNotFound { variable: &'static str, path: PathBuf },

    #[error("{variable} specifies a file, not a directory: {path}")]
    ConfigDirNotDirectory { variable: &'static str, path: PathBuf },

    #[error("{variable} specifies an invalid config directory, missing: {}", missing.join(", "))]
    ConfigDirIncomplete {
        variable: &'static str,
        path: PathBuf,
        missing: Vec<String>,
    },

    #[error("{variable} specifies a resource path that does not exist: {path}")]
    ResourceDirNotFound { variable: &'static str, path: PathBuf },

    #[error("{variable} specifies an invalid resource directory: {path}")]
    ResourceDirInvalid { variable: &'static str, path: PathBuf },
}
