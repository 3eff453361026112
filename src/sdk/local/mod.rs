// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! SQLite-backed binding of the engine call contract.
//!
//! Stores configurations, records and redo records in the database named by
//! the settings' `SQL.CONNECTION`. No matching or scoring happens here: every
//! record is its own entity and searches are exact attribute matches.

mod config_manager;
mod engine;
mod store;

pub use config_manager::{LocalConfigManager, LocalConfigTool};
pub use engine::{LocalDiagnostic, LocalEngine};
pub use store::Store;

use crate::config::consts::{CONFIG_TEMPLATE_FILE, TEMPLATES_DIR};
use crate::errors::SzError;
use crate::sdk::{
    Settings, SzConfigManager, SzConfigTool, SzDiagnostic, SzEngine, SzEnvironment,
    SzEnvironmentFactory,
};
use std::sync::Arc;

/// Configuration template used when the installation does not provide one.
pub const DEFAULT_TEMPLATE: &str = r#"{"G2_CONFIG":{"CFG_DSRC":[{"DSRC_ID":1,"DSRC_CODE":"TEST"},{"DSRC_ID":2,"DSRC_CODE":"SEARCH"}],"CONFIG_BASE_VERSION":{"VERSION":"4.0.0","COMPATIBILITY_VERSION":{"CONFIG_VERSION":"11"}}}}"#;

pub struct LocalEnvironment {
    config_manager: LocalConfigManager,
    config_tool: LocalConfigTool,
    engine: Arc<LocalEngine>,
    diagnostic: LocalDiagnostic,
}

impl LocalEnvironment {
    pub fn new(settings: &str) -> Result<Self, SzError> {
        let settings = Settings::parse(settings)?;
        let store = Store::open(&settings.sqlite_path()?)?;

        let template = settings
            .pipeline
            .resource_path
            .as_ref()
            .map(|dir| dir.join(TEMPLATES_DIR).join(CONFIG_TEMPLATE_FILE))
            .filter(|path| path.is_file());

        Ok(Self {
            config_manager: LocalConfigManager::new(store.clone()),
            config_tool: LocalConfigTool::new(template),
            engine: Arc::new(LocalEngine::new(store.clone())),
            diagnostic: LocalDiagnostic::new(store),
        })
    }
}

impl SzEnvironment for LocalEnvironment {
    fn config_manager(&self) -> &dyn SzConfigManager {
        &self.config_manager
    }

    fn config_tool(&self) -> &dyn SzConfigTool {
        &self.config_tool
    }

    fn engine(&self) -> Arc<dyn SzEngine> {
        self.engine.clone()
    }

    fn diagnostic(&self) -> &dyn SzDiagnostic {
        &self.diagnostic
    }
}

/// Creates [`LocalEnvironment`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEnvironmentFactory;

impl SzEnvironmentFactory for LocalEnvironmentFactory {
    fn create(&self, settings: &str) -> Result<Box<dyn SzEnvironment>, SzError> {
        Ok(Box::new(LocalEnvironment::new(settings)?))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::sdk::ConfigDocument;
    use std::path::Path;
    use tempfile::TempDir;

    /// A fresh repository with the default template registered as default.
    pub struct TestRepository {
        pub dir: TempDir,
        pub settings: String,
    }

    impl TestRepository {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let settings = Settings::sqlite(
                dir.path(),
                dir.path(),
                Path::new("/nonexistent-resources"),
                &dir.path().join("G2C-test.db"),
            )
            .to_json()
            .unwrap();

            let env = LocalEnvironment::new(&settings).unwrap();
            let manager = env.config_manager();
            let id = manager.add_config(DEFAULT_TEMPLATE, "Default Config").unwrap();
            manager.set_default_config_id(id).unwrap();

            Self { dir, settings }
        }

        pub fn environment(&self) -> LocalEnvironment {
            LocalEnvironment::new(&self.settings).unwrap()
        }

        pub fn add_data_sources(&self, codes: &[&str]) {
            let env = self.environment();
            crate::sdk::update_default_config(
                env.config_manager(),
                env.config_tool(),
                "test sources",
                |doc: &mut ConfigDocument| {
                    for code in codes {
                        doc.add_data_source(code)?;
                    }
                    Ok(())
                },
            )
            .unwrap();
        }
    }
}
