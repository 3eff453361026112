// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Call contract for the external entity-resolution engine.
//!
//! The engine is an opaque collaborator: synchronous calls that return JSON
//! text or a typed [`SzError`]. Everything the runner and the demo workloads
//! need goes through the traits in this module, so any binding of the
//! engine can be dropped in behind an [`SzEnvironmentFactory`].
//!
//! [`local`] provides a SQLite-backed binding that stores configurations,
//! records and redo records without performing entity resolution.

mod config;
pub mod local;
mod settings;

pub use config::ConfigDocument;
pub use settings::{PipelineSettings, Settings, SqlSettings};

use crate::errors::SzError;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Identifies a record by data source code and record ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SzRecordKey {
    pub data_source: String,
    pub record_id: Option<String>,
}

impl SzRecordKey {
    pub fn new(data_source: impl Into<String>, record_id: Option<String>) -> Self {
        Self {
            data_source: data_source.into(),
            record_id,
        }
    }
}

impl fmt::Display for SzRecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "{}:{}", self.data_source, id),
            None => write!(f, "{}:<generated>", self.data_source),
        }
    }
}

/// Bit set of options passed to engine calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SzFlags(u64);

impl SzFlags {
    pub const NO_FLAGS: SzFlags = SzFlags(0);
    /// Return an INFO message describing the affected entities.
    pub const WITH_INFO: SzFlags = SzFlags(1 << 62);

    pub fn contains(self, other: SzFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u64 {
        self.0
    }
}

impl BitOr for SzFlags {
    type Output = SzFlags;

    fn bitor(self, rhs: SzFlags) -> SzFlags {
        SzFlags(self.0 | rhs.0)
    }
}

/// Registry of persisted configurations and the active default.
pub trait SzConfigManager: Send + Sync {
    /// Persist a configuration definition and return its ID.
    fn add_config(&self, definition: &str, comment: &str) -> Result<i64, SzError>;

    fn get_config(&self, config_id: i64) -> Result<String, SzError>;

    fn get_config_registry(&self) -> Result<String, SzError>;

    /// `None` when no default has ever been set.
    fn get_default_config_id(&self) -> Result<Option<i64>, SzError>;

    fn set_default_config_id(&self, config_id: i64) -> Result<(), SzError>;

    /// Swap the default only if it is still `current`.
    ///
    /// Fails with [`SzError::ReplaceConflict`] when another writer changed the
    /// default in the meantime.
    fn replace_default_config_id(&self, current: i64, new: i64) -> Result<(), SzError>;
}

/// Builds in-memory configuration documents.
pub trait SzConfigTool: Send + Sync {
    /// A new document from the installation's configuration template.
    fn create_config(&self) -> Result<ConfigDocument, SzError>;

    fn import_config(&self, definition: &str) -> Result<ConfigDocument, SzError> {
        ConfigDocument::from_json(definition)
    }
}

/// Record-level operations.
///
/// Mutating calls return the INFO message when [`SzFlags::WITH_INFO`] is set.
pub trait SzEngine: Send + Sync {
    fn add_record(
        &self,
        key: &SzRecordKey,
        definition: &str,
        flags: SzFlags,
    ) -> Result<Option<String>, SzError>;

    fn delete_record(&self, key: &SzRecordKey, flags: SzFlags) -> Result<Option<String>, SzError>;

    fn get_record(&self, key: &SzRecordKey) -> Result<String, SzError>;

    fn search_by_attributes(&self, attributes: &str) -> Result<String, SzError>;

    /// Take the next pending redo record, if any.
    fn get_redo_record(&self) -> Result<Option<String>, SzError>;

    fn count_redo_records(&self) -> Result<i64, SzError>;

    fn process_redo_record(&self, redo: &str, flags: SzFlags) -> Result<Option<String>, SzError>;
}

pub trait SzDiagnostic: Send + Sync {
    /// Remove all record data while keeping registered configurations.
    fn purge_repository(&self) -> Result<(), SzError>;
}

/// An initialised connection to the engine. Resources are released on drop.
pub trait SzEnvironment: Send + Sync {
    fn config_manager(&self) -> &dyn SzConfigManager;

    fn config_tool(&self) -> &dyn SzConfigTool;

    fn engine(&self) -> Arc<dyn SzEngine>;

    fn diagnostic(&self) -> &dyn SzDiagnostic;
}

/// Creates environments from a settings JSON document.
pub trait SzEnvironmentFactory: Send + Sync {
    fn create(&self, settings: &str) -> Result<Box<dyn SzEnvironment>, SzError>;
}

/// Apply `edit` to the current default configuration and make the result the
/// new default.
///
/// A concurrent change to the default is not a failure: the latest default is
/// re-read and the edit is applied again until the replace succeeds.
pub fn update_default_config<F>(
    manager: &dyn SzConfigManager,
    tool: &dyn SzConfigTool,
    comment: &str,
    mut edit: F,
) -> Result<i64, SzError>
where
    F: FnMut(&mut ConfigDocument) -> Result<(), SzError>,
{
    loop {
        let current = manager.get_default_config_id()?.ok_or_else(|| {
            SzError::Configuration("no default configuration is registered".to_string())
        })?;

        let mut document = tool.import_config(&manager.get_config(current)?)?;
        edit(&mut document)?;
        let new_id = manager.add_config(&document.export()?, comment)?;

        match manager.replace_default_config_id(current, new_id) {
            Ok(()) => return Ok(new_id),
            Err(SzError::ReplaceConflict(_)) => continue,
            Err(e) => return Err(e),
        }
    }
}
