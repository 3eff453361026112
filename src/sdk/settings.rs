// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SzError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SQLITE_SCHEME: &str = "sqlite3://";

/// The engine settings document.
///
/// ```json
/// {
///   "PIPELINE": { "SUPPORTPATH": "...", "CONFIGPATH": "...", "RESOURCEPATH": "..." },
///   "SQL": { "CONNECTION": "sqlite3://na:na@/tmp/G2C-abc.db" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "PIPELINE", default)]
    pub pipeline: PipelineSettings,
    #[serde(rename = "SQL")]
    pub sql: SqlSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(rename = "SUPPORTPATH", default, skip_serializing_if = "Option::is_none")]
    pub support_path: Option<PathBuf>,
    #[serde(rename = "CONFIGPATH", default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(rename = "RESOURCEPATH", default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlSettings {
    #[serde(rename = "CONNECTION")]
    pub connection: String,
}

impl Settings {
    /// Settings for a SQLite repository at `database`.
    pub fn sqlite(
        support: &Path,
        config: &Path,
        resource: &Path,
        database: &Path,
    ) -> Self {
        Self {
            pipeline: PipelineSettings {
                support_path: Some(support.to_path_buf()),
                config_path: Some(config.to_path_buf()),
                resource_path: Some(resource.to_path_buf()),
            },
            sql: SqlSettings {
                connection: format!("{SQLITE_SCHEME}na:na@{}", database.display()),
            },
        }
    }

    pub fn parse(settings: &str) -> Result<Self, SzError> {
        serde_json::from_str(settings.trim())
            .map_err(|e| SzError::Configuration(format!("invalid settings: {e}")))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Database file named by a `sqlite3://[user:pass@]path` connection string.
    pub fn sqlite_path(&self) -> Result<PathBuf, SzError> {
        let rest = self
            .sql
            .connection
            .strip_prefix(SQLITE_SCHEME)
            .ok_or_else(|| {
                SzError::Configuration(format!(
                    "unsupported database connection: {}",
                    self.sql.connection
                ))
            })?;

        let path = match rest.split_once('@') {
            Some((_credentials, path)) => path,
            None => rest,
        };

        if path.trim().is_empty() {
            return Err(SzError::Configuration(
                "database connection does not name a file".to_string(),
            ));
        }
        Ok(PathBuf::from(path))
    }
}
