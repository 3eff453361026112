// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::store::Store;
use super::DEFAULT_TEMPLATE;
use crate::errors::SzError;
use crate::sdk::{ConfigDocument, SzConfigManager, SzConfigTool};
use rusqlite::TransactionBehavior;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Configuration registry stored in `SZL_CONFIG`.
///
/// A configuration's ID is the CRC-32 of its definition with object keys in
/// sorted order, so registering the same definition twice yields the same ID
/// however its keys are laid out.
pub struct LocalConfigManager {
    store: Store,
}

impl LocalConfigManager {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn config_id(definition: &str) -> Result<i64, SzError> {
        let value: Value = serde_json::from_str(definition)
            .map_err(|e| SzError::BadInput(format!("configuration is not valid JSON: {e}")))?;
        let canonical = canonical(&value).to_string();
        Ok(i64::from(crc32fast::hash(canonical.as_bytes())))
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

impl SzConfigManager for LocalConfigManager {
    fn add_config(&self, definition: &str, comment: &str) -> Result<i64, SzError> {
        ConfigDocument::from_json(definition)?;
        let config_id = Self::config_id(definition)?;

        let conn = self.store.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO SZL_CONFIG (CONFIG_ID, CONFIG_DATA, CONFIG_COMMENTS) VALUES (?1, ?2, ?3)",
            rusqlite::params![config_id, definition, comment],
        )?;
        Ok(config_id)
    }

    fn get_config(&self, config_id: i64) -> Result<String, SzError> {
        let conn = self.store.lock()?;
        Store::config_data(&conn, config_id)?
            .ok_or_else(|| SzError::NotFound(format!("configuration {config_id}")))
    }

    fn get_config_registry(&self) -> Result<String, SzError> {
        let conn = self.store.lock()?;
        let mut statement = conn.prepare(
            "SELECT CONFIG_ID, CONFIG_COMMENTS, SYS_CREATE_DT FROM SZL_CONFIG ORDER BY SYS_CREATE_DT, CONFIG_ID",
        )?;
        let configs = statement
            .query_map([], |row| {
                Ok(json!({
                    "CONFIG_ID": row.get::<_, i64>(0)?,
                    "CONFIG_COMMENTS": row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    "SYS_CREATE_DT": row.get::<_, String>(2)?,
                }))
            })?
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(json!({ "CONFIGS": configs }).to_string())
    }

    fn get_default_config_id(&self) -> Result<Option<i64>, SzError> {
        let conn = self.store.lock()?;
        Store::default_config_id(&conn)
    }

    fn set_default_config_id(&self, config_id: i64) -> Result<(), SzError> {
        let conn = self.store.lock()?;
        if Store::config_data(&conn, config_id)?.is_none() {
            return Err(SzError::NotFound(format!("configuration {config_id}")));
        }
        Store::write_default_config_id(&conn, config_id)
    }

    fn replace_default_config_id(&self, current: i64, new: i64) -> Result<(), SzError> {
        let mut conn = self.store.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if Store::config_data(&tx, new)?.is_none() {
            return Err(SzError::NotFound(format!("configuration {new}")));
        }
        match Store::default_config_id(&tx)? {
            Some(actual) if actual == current => {}
            actual => {
                return Err(SzError::ReplaceConflict(format!(
                    "default configuration is {}, expected {current}",
                    actual.map(|id| id.to_string()).unwrap_or_else(|| "unset".to_string())
                )))
            }
        }

        Store::write_default_config_id(&tx, new)?;
        tx.commit()?;
        Ok(())
    }
}

/// Creates documents from the installation template, falling back to
/// [`DEFAULT_TEMPLATE`].
pub struct LocalConfigTool {
    template: Option<PathBuf>,
}

impl LocalConfigTool {
    pub fn new(template: Option<PathBuf>) -> Self {
        Self { template }
    }
}

impl SzConfigTool for LocalConfigTool {
    fn create_config(&self) -> Result<ConfigDocument, SzError> {
        match &self.template {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    SzError::Configuration(format!(
                        "cannot read configuration template {}: {e}",
                        path.display()
                    ))
                })?;
                ConfigDocument::from_json(&text)
            }
            None => ConfigDocument::from_json(DEFAULT_TEMPLATE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestRepository;
    use super::*;
    use crate::sdk::SzEnvironment;
    use tempfile::NamedTempFile;

    #[test]
    fn same_definition_same_id() {
        let repo = TestRepository::new();
        let env = repo.environment();
        let manager = env.config_manager();

        let first = manager.add_config(DEFAULT_TEMPLATE, "one").unwrap();
        let second = manager.add_config(DEFAULT_TEMPLATE, "two").unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.get_default_config_id().unwrap(), Some(first));
    }

    #[test]
    fn export_import_register_round_trip() {
        let repo = TestRepository::new();
        let env = repo.environment();
        let manager = env.config_manager();

        let default_id = manager.get_default_config_id().unwrap().unwrap();
        let definition = manager.get_config(default_id).unwrap();
        let exported = env.config_tool().import_config(&definition).unwrap().export().unwrap();

        assert_eq!(manager.add_config(&exported, "again").unwrap(), default_id);
    }

    #[test]
    fn key_order_does_not_change_id() {
        let repo = TestRepository::new();
        let env = repo.environment();
        let manager = env.config_manager();

        let unsorted = r#"{"G2_CONFIG":{"CFG_DSRC":[{"DSRC_ID":1,"DSRC_CODE":"TEST"}],"CONFIG_BASE_VERSION":{"VERSION":"4.0.0"}}}"#;
        let sorted = r#"{"G2_CONFIG":{"CONFIG_BASE_VERSION":{"VERSION":"4.0.0"},"CFG_DSRC":[{"DSRC_CODE":"TEST","DSRC_ID":1}]}}"#;

        assert_eq!(
            manager.add_config(unsorted, "unsorted").unwrap(),
            manager.add_config(sorted, "sorted").unwrap()
        );
    }

    #[test]
    fn replace_requires_current_default() {
        let repo = TestRepository::new();
        let env = repo.environment();
        let manager = env.config_manager();
        let default_id = manager.get_default_config_id().unwrap().unwrap();

        let mut doc = env.config_tool().create_config().unwrap();
        doc.add_data_source("CUSTOMERS").unwrap();
        let new_id = manager.add_config(&doc.export().unwrap(), "customers").unwrap();

        assert!(matches!(
            manager.replace_default_config_id(default_id + 1, new_id),
            Err(SzError::ReplaceConflict(_))
        ));
        manager.replace_default_config_id(default_id, new_id).unwrap();
        assert_eq!(manager.get_default_config_id().unwrap(), Some(new_id));

        let registry: Value = serde_json::from_str(&manager.get_config_registry().unwrap()).unwrap();
        assert_eq!(registry["CONFIGS"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_config_is_not_found() {
        let repo = TestRepository::new();
        let env = repo.environment();
        assert!(matches!(
            env.config_manager().get_config(1),
            Err(SzError::NotFound(_))
        ));
        assert!(matches!(
            env.config_manager().set_default_config_id(1),
            Err(SzError::NotFound(_))
        ));
    }

    #[test]
    fn template_file_is_preferred() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"G2_CONFIG":{"CFG_DSRC":[{"DSRC_ID":1,"DSRC_CODE":"ONLY"}]}}"#,
        )
        .unwrap();

        let tool = LocalConfigTool::new(Some(file.path().to_path_buf()));
        assert_eq!(tool.create_config().unwrap().data_source_codes(), vec!["ONLY"]);
        assert_eq!(
            LocalConfigTool::new(None).create_config().unwrap().data_source_codes(),
            vec!["TEST", "SEARCH"]
        );
    }
}
