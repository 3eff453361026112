// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Throwaway SQLite repository for runs without external settings.

use crate::config::consts::{
    DEFAULT_CONFIG_COMMENT, SCHEMA_DIR, SCHEMA_FILE, TEMP_DATABASE_PREFIX, TEMP_DATABASE_SUFFIX,
};
use crate::errors::RepositoryError;
use crate::install::InstallLocations;
use crate::observability::messages::repository::{
    DefaultConfigRegistered, SchemaApplied, TempRepositoryCleanupFailed,
};
use crate::observability::messages::StructuredLog;
use crate::sdk::{Settings, SzEnvironmentFactory};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A freshly created repository database registered with a default
/// configuration. The database file is deleted when this is dropped.
pub struct TempRepository {
    database: Option<TempPath>,
    path: PathBuf,
    settings: String,
    default_config_id: i64,
}

impl TempRepository {
    pub fn create(
        locations: &InstallLocations,
        factory: &dyn SzEnvironmentFactory,
    ) -> Result<Self, RepositoryError> {
        let support = locations.support_dir();
        let config = required(locations.config_dir(), "config")?;
        let resources = required(locations.resource_dir(), "resource")?;
        required(locations.templates_dir(), "templates")?;

        let database = tempfile::Builder::new()
            .prefix(TEMP_DATABASE_PREFIX)
            .suffix(TEMP_DATABASE_SUFFIX)
            .tempfile()
            .map_err(RepositoryError::TempFile)?
            .into_temp_path();
        let path = database.to_path_buf();

        apply_schema(&path, &resources.join(SCHEMA_DIR).join(SCHEMA_FILE))?;

        let settings = Settings::sqlite(support, config, resources, &path).to_json()?;

        let env = factory.create(&settings)?;
        let definition = env.config_tool().create_config()?.export()?;
        let manager = env.config_manager();
        let default_config_id = manager.add_config(&definition, DEFAULT_CONFIG_COMMENT)?;
        manager.set_default_config_id(default_config_id)?;
        DefaultConfigRegistered {
            config_id: default_config_id,
        }
        .log();

        Ok(Self {
            database: Some(database),
            path,
            settings,
            default_config_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings JSON pointing at this repository.
    pub fn settings(&self) -> &str {
        &self.settings
    }

    pub fn default_config_id(&self) -> i64 {
        self.default_config_id
    }
}

impl Drop for TempRepository {
    fn drop(&mut self) {
        if let Some(database) = self.database.take() {
            if let Err(error) = database.close() {
                TempRepositoryCleanupFailed {
                    database: &self.path,
                    error: &error,
                }
                .log();
            }
        }
    }
}

fn required<'a>(dir: Option<&'a Path>, name: &'static str) -> Result<&'a Path, RepositoryError> {
    dir.ok_or(RepositoryError::MissingDirectory { name })
}

/// Execute the schema script one non-blank line at a time.
fn apply_schema(database: &Path, schema: &Path) -> Result<(), RepositoryError> {
    let script = fs::read_to_string(schema).map_err(|source| RepositoryError::Read {
        path: schema.to_path_buf(),
        source,
    })?;

    let connection = Connection::open(database).map_err(RepositoryError::Open)?;
    let mut statements = 0;
    for line in script.lines().map(str::trim).filter(|line| !line.is_empty()) {
        connection
            .execute_batch(line)
            .map_err(|source| RepositoryError::Schema {
                statement: line.to_string(),
                source,
            })?;
        statements += 1;
    }

    SchemaApplied {
        database,
        statements,
    }
    .log();
    Ok(())
}
