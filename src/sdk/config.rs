// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SzError;
use serde_json::{json, Map, Value};

const ROOT_KEY: &str = "G2_CONFIG";
const DATA_SOURCES_KEY: &str = "CFG_DSRC";
const DSRC_ID: &str = "DSRC_ID";
const DSRC_CODE: &str = "DSRC_CODE";

/// An in-memory configuration definition being inspected or modified.
///
/// Owned value; nothing needs closing. Exporting an unmodified document
/// yields text that imports back to an equivalent document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    pub fn from_json(definition: &str) -> Result<Self, SzError> {
        let root: Value = serde_json::from_str(definition)
            .map_err(|e| SzError::BadInput(format!("configuration is not valid JSON: {e}")))?;

        let has_sources = root
            .get(ROOT_KEY)
            .and_then(|cfg| cfg.get(DATA_SOURCES_KEY))
            .map(Value::is_array)
            .unwrap_or(false);
        if !has_sources {
            return Err(SzError::BadInput(format!(
                "configuration must contain {ROOT_KEY}.{DATA_SOURCES_KEY}"
            )));
        }

        Ok(Self { root })
    }

    /// Registered data source codes, in registration order.
    pub fn data_source_codes(&self) -> Vec<String> {
        self.data_sources()
            .iter()
            .filter_map(|ds| ds.get(DSRC_CODE).and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    pub fn has_data_source(&self, code: &str) -> bool {
        self.data_source_codes()
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(code))
    }

    /// Register a data source; returns `{"DSRC_ID": n}`.
    pub fn add_data_source(&mut self, code: &str) -> Result<String, SzError> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(SzError::BadInput("data source code is empty".to_string()));
        }
        if self.has_data_source(&code) {
            return Err(SzError::BadInput(format!(
                "data source already exists: {code}"
            )));
        }

        let next_id = self
            .data_sources()
            .iter()
            .filter_map(|ds| ds.get(DSRC_ID).and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;

        let mut entry = Map::new();
        entry.insert(DSRC_ID.to_string(), json!(next_id));
        entry.insert(DSRC_CODE.to_string(), json!(code));
        self.data_sources_mut()?.push(Value::Object(entry));

        Ok(json!({ DSRC_ID: next_id }).to_string())
    }

    pub fn delete_data_source(&mut self, code: &str) -> Result<(), SzError> {
        let sources = self.data_sources_mut()?;
        let before = sources.len();
        sources.retain(|ds| {
            !ds.get(DSRC_CODE)
                .and_then(Value::as_str)
                .map(|existing| existing.eq_ignore_ascii_case(code.trim()))
                .unwrap_or(false)
        });

        if sources.len() == before {
            return Err(SzError::NotFound(format!("data source {}", code.trim())));
        }
        Ok(())
    }

    /// `{"DATA_SOURCES": [{"DSRC_ID": 1, "DSRC_CODE": "TEST"}, ...]}`
    pub fn get_data_sources(&self) -> String {
        let listed: Vec<Value> = self
            .data_sources()
            .iter()
            .map(|ds| {
                json!({
                    DSRC_ID: ds.get(DSRC_ID).cloned().unwrap_or(Value::Null),
                    DSRC_CODE: ds.get(DSRC_CODE).cloned().unwrap_or(Value::Null),
                })
            })
            .collect();
        json!({ "DATA_SOURCES": listed }).to_string()
    }

    pub fn export(&self) -> Result<String, SzError> {
        serde_json::to_string(&self.root)
            .map_err(|e| SzError::Unrecoverable(format!("failed to export configuration: {e}")))
    }

    fn data_sources(&self) -> &[Value] {
        self.root
            .get(ROOT_KEY)
            .and_then(|cfg| cfg.get(DATA_SOURCES_KEY))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn data_sources_mut(&mut self) -> Result<&mut Vec<Value>, SzError> {
        self.root
            .get_mut(ROOT_KEY)
            .and_then(|cfg| cfg.get_mut(DATA_SOURCES_KEY))
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                SzError::Unrecoverable(format!("{ROOT_KEY}.{DATA_SOURCES_KEY} is missing"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::local::DEFAULT_TEMPLATE;

    #[test]
    fn template_declares_test_and_search() {
        let doc = ConfigDocument::from_json(DEFAULT_TEMPLATE).unwrap();
        assert_eq!(doc.data_source_codes(), vec!["TEST", "SEARCH"]);
    }

    #[test]
    fn add_data_source_assigns_next_id() {
        let mut doc = ConfigDocument::from_json(DEFAULT_TEMPLATE).unwrap();
        let response = doc.add_data_source(" customers ").unwrap();

        assert_eq!(response, r#"{"DSRC_ID":3}"#);
        assert!(doc.has_data_source("CUSTOMERS"));
        assert!(doc.get_data_sources().contains(r#""DSRC_CODE":"CUSTOMERS""#));
    }

    #[test]
    fn duplicate_and_empty_codes_are_bad_input() {
        let mut doc = ConfigDocument::from_json(DEFAULT_TEMPLATE).unwrap();
        assert!(matches!(doc.add_data_source("test"), Err(SzError::BadInput(_))));
        assert!(matches!(doc.add_data_source("  "), Err(SzError::BadInput(_))));
    }

    #[test]
    fn delete_data_source() {
        let mut doc = ConfigDocument::from_json(DEFAULT_TEMPLATE).unwrap();
        doc.delete_data_source("search").unwrap();
        assert_eq!(doc.data_source_codes(), vec!["TEST"]);
        assert!(matches!(doc.delete_data_source("SEARCH"), Err(SzError::NotFound(_))));
    }

    #[test]
    fn export_is_stable_across_import() {
        let mut doc = ConfigDocument::from_json(DEFAULT_TEMPLATE).unwrap();
        doc.add_data_source("WATCHLIST").unwrap();

        let exported = doc.export().unwrap();
        let reimported = ConfigDocument::from_json(&exported).unwrap();

        assert_eq!(reimported.export().unwrap(), exported);
        assert_eq!(reimported.data_source_codes(), doc.data_source_codes());
    }

    #[test]
    fn rejects_documents_without_data_sources() {
        assert!(matches!(
            ConfigDocument::from_json(r#"{"G2_CONFIG":{}}"#),
            Err(SzError::BadInput(_))
        ));
        assert!(matches!(
            ConfigDocument::from_json("not json"),
            Err(SzError::BadInput(_))
        ));
    }
}
