// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::store::Store;
use crate::config::consts::{DATA_SOURCE_FIELD, RECORD_ID_FIELD};
use crate::errors::SzError;
use crate::sdk::{SzDiagnostic, SzEngine, SzFlags, SzRecordKey};
use rusqlite::{OptionalExtension, TransactionBehavior};
use serde_json::{json, Map, Value};

const REDO_REASON_REPLACED: &str = "RECORD_REPLACED";
const REDO_REASON_DELETED: &str = "RECORD_DELETED";

pub struct LocalEngine {
    store: Store,
}

impl LocalEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

fn parse_object(text: &str, what: &str) -> Result<Map<String, Value>, SzError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SzError::BadInput(format!("{what} must be a JSON object"))),
        Err(e) => Err(SzError::BadInput(format!("{what} is not valid JSON: {e}"))),
    }
}

fn text_field(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field) {
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn info_message(data_source: &str, record_id: &str, entity_id: Option<i64>) -> String {
    let affected: Vec<Value> = entity_id
        .into_iter()
        .map(|id| json!({ "ENTITY_ID": id }))
        .collect();
    json!({
        DATA_SOURCE_FIELD: data_source,
        RECORD_ID_FIELD: record_id,
        "AFFECTED_ENTITIES": affected,
    })
    .to_string()
}

fn redo_message(reason: &str, data_source: &str, record_id: &str) -> String {
    json!({
        "REASON": reason,
        DATA_SOURCE_FIELD: data_source,
        RECORD_ID_FIELD: record_id,
    })
    .to_string()
}

fn entity_id(
    conn: &rusqlite::Connection,
    data_source: &str,
    record_id: &str,
) -> Result<Option<i64>, SzError> {
    Ok(conn
        .query_row(
            "SELECT ENTITY_ID FROM SZL_RECORD WHERE DSRC_CODE = ?1 AND RECORD_ID = ?2",
            [data_source, record_id],
            |row| row.get(0),
        )
        .optional()?)
}

impl SzEngine for LocalEngine {
    fn add_record(
        &self,
        key: &SzRecordKey,
        definition: &str,
        flags: SzFlags,
    ) -> Result<Option<String>, SzError> {
        let record = parse_object(definition, "record")?;
        let data_source = key.data_source.trim().to_ascii_uppercase();

        if let Some(declared) = text_field(&record, DATA_SOURCE_FIELD) {
            if !declared.eq_ignore_ascii_case(&data_source) {
                return Err(SzError::BadInput(format!(
                    "record declares {DATA_SOURCE_FIELD} {declared} but was added as {data_source}"
                )));
            }
        }

        let declared_id = text_field(&record, RECORD_ID_FIELD);
        let record_id = match (&key.record_id, declared_id) {
            (Some(id), Some(declared)) if *id != declared => {
                return Err(SzError::BadInput(format!(
                    "record declares {RECORD_ID_FIELD} {declared} but was added as {id}"
                )))
            }
            (Some(id), _) => id.clone(),
            (None, Some(declared)) => declared,
            (None, None) => format!("{:08X}", crc32fast::hash(definition.as_bytes())),
        };

        let mut conn = self.store.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !Store::active_config(&tx)?.has_data_source(&data_source) {
            return Err(SzError::BadInput(format!(
                "data source is not registered: {data_source}"
            )));
        }

        let existing = entity_id(&tx, &data_source, &record_id)?;
        let entity = match existing {
            Some(entity) => {
                tx.execute(
                    "UPDATE SZL_RECORD SET JSON_DATA = ?1 WHERE ENTITY_ID = ?2",
                    rusqlite::params![definition, entity],
                )?;
                Store::enqueue_redo(
                    &tx,
                    &redo_message(REDO_REASON_REPLACED, &data_source, &record_id),
                )?;
                entity
            }
            None => {
                tx.execute(
                    "INSERT INTO SZL_RECORD (DSRC_CODE, RECORD_ID, JSON_DATA) VALUES (?1, ?2, ?3)",
                    rusqlite::params![data_source, record_id, definition],
                )?;
                tx.last_insert_rowid()
            }
        };
        tx.commit()?;

        Ok(flags
            .contains(SzFlags::WITH_INFO)
            .then(|| info_message(&data_source, &record_id, Some(entity))))
    }

    fn delete_record(&self, key: &SzRecordKey, flags: SzFlags) -> Result<Option<String>, SzError> {
        let record_id = key
            .record_id
            .as_deref()
            .ok_or_else(|| SzError::BadInput(format!("record ID is required to delete {key}")))?;
        let data_source = key.data_source.trim().to_ascii_uppercase();

        let mut conn = self.store.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = entity_id(&tx, &data_source, record_id)?;
        if let Some(entity) = existing {
            tx.execute("DELETE FROM SZL_RECORD WHERE ENTITY_ID = ?1", [entity])?;
            Store::enqueue_redo(
                &tx,
                &redo_message(REDO_REASON_DELETED, &data_source, record_id),
            )?;
        }
        tx.commit()?;

        Ok(flags
            .contains(SzFlags::WITH_INFO)
            .then(|| info_message(&data_source, record_id, existing)))
    }

    fn get_record(&self, key: &SzRecordKey) -> Result<String, SzError> {
        let record_id = key
            .record_id
            .as_deref()
            .ok_or_else(|| SzError::BadInput(format!("record ID is required to get {key}")))?;
        let data_source = key.data_source.trim().to_ascii_uppercase();

        let conn = self.store.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT JSON_DATA FROM SZL_RECORD WHERE DSRC_CODE = ?1 AND RECORD_ID = ?2",
                rusqlite::params![data_source, record_id],
                |row| row.get(0),
            )
            .optional()?;
        let data = data.ok_or_else(|| SzError::NotFound(format!("record {key}")))?;

        let json_data: Value = serde_json::from_str(&data)
            .map_err(|e| SzError::Unrecoverable(format!("stored record {key} is corrupt: {e}")))?;
        Ok(json!({
            DATA_SOURCE_FIELD: data_source,
            RECORD_ID_FIELD: record_id,
            "JSON_DATA": json_data,
        })
        .to_string())
    }

    fn search_by_attributes(&self, attributes: &str) -> Result<String, SzError> {
        let criteria: Vec<(String, String)> = parse_object(attributes, "search attributes")?
            .into_iter()
            .filter_map(|(name, value)| match value {
                Value::String(s) if !s.trim().is_empty() => Some((name, s.trim().to_string())),
                _ => None,
            })
            .collect();
        if criteria.is_empty() {
            return Err(SzError::BadInput(
                "search requires at least one string attribute".to_string(),
            ));
        }

        let conn = self.store.lock()?;
        let mut statement = conn.prepare(
            "SELECT ENTITY_ID, DSRC_CODE, RECORD_ID, JSON_DATA FROM SZL_RECORD ORDER BY ENTITY_ID",
        )?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut resolved = Vec::new();
        for (entity, data_source, record_id, data) in rows {
            let Ok(Value::Object(record)) = serde_json::from_str::<Value>(&data) else {
                continue;
            };
            let matches = criteria.iter().all(|(name, wanted)| {
                record
                    .get(name)
                    .and_then(Value::as_str)
                    .map(|have| have.trim().eq_ignore_ascii_case(wanted))
                    .unwrap_or(false)
            });
            if matches {
                resolved.push(json!({
                    "ENTITY": {
                        "RESOLVED_ENTITY": {
                            "ENTITY_ID": entity,
                            "RECORDS": [{ DATA_SOURCE_FIELD: data_source, RECORD_ID_FIELD: record_id }],
                        }
                    }
                }));
            }
        }

        Ok(json!({ "RESOLVED_ENTITIES": resolved }).to_string())
    }

    fn get_redo_record(&self) -> Result<Option<String>, SzError> {
        let mut conn = self.store.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let next: Option<(i64, String)> = tx
            .query_row(
                "SELECT REDO_ID, REDO_DATA FROM SZL_REDO ORDER BY REDO_ID LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((redo_id, _)) = &next {
            tx.execute("DELETE FROM SZL_REDO WHERE REDO_ID = ?1", [redo_id])?;
        }
        tx.commit()?;

        Ok(next.map(|(_, data)| data))
    }

    fn count_redo_records(&self) -> Result<i64, SzError> {
        let conn = self.store.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM SZL_REDO", [], |row| row.get(0))?)
    }

    fn process_redo_record(&self, redo: &str, flags: SzFlags) -> Result<Option<String>, SzError> {
        let message = parse_object(redo, "redo record")?;
        let (Some(data_source), Some(record_id)) = (
            text_field(&message, DATA_SOURCE_FIELD),
            text_field(&message, RECORD_ID_FIELD),
        ) else {
            return Err(SzError::BadInput(format!(
                "redo record must name {DATA_SOURCE_FIELD} and {RECORD_ID_FIELD}"
            )));
        };

        let conn = self.store.lock()?;
        let entity = entity_id(&conn, &data_source, &record_id)?;

        Ok(flags
            .contains(SzFlags::WITH_INFO)
            .then(|| info_message(&data_source, &record_id, entity)))
    }
}

pub struct LocalDiagnostic {
    store: Store,
}

impl LocalDiagnostic {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl SzDiagnostic for LocalDiagnostic {
    fn purge_repository(&self) -> Result<(), SzError> {
        let conn = self.store.lock()?;
        conn.execute_batch("DELETE FROM SZL_RECORD; DELETE FROM SZL_REDO;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestRepository;
    use super::*;
    use crate::sdk::SzEnvironment;

    fn key(data_source: &str, record_id: &str) -> SzRecordKey {
        SzRecordKey::new(data_source, Some(record_id.to_string()))
    }

    #[test]
    fn add_and_get_record() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        let info = engine
            .add_record(
                &key("TEST", "1"),
                r#"{"NAME_FULL":"Joe Schmoe"}"#,
                SzFlags::WITH_INFO,
            )
            .unwrap()
            .unwrap();
        let info: Value = serde_json::from_str(&info).unwrap();
        assert_eq!(info["RECORD_ID"], "1");
        assert_eq!(info["AFFECTED_ENTITIES"].as_array().unwrap().len(), 1);

        let record: Value = serde_json::from_str(&engine.get_record(&key("test", "1")).unwrap()).unwrap();
        assert_eq!(record["DATA_SOURCE"], "TEST");
        assert_eq!(record["JSON_DATA"]["NAME_FULL"], "Joe Schmoe");
    }

    #[test]
    fn no_flags_returns_no_info() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();
        assert_eq!(
            engine
                .add_record(&key("TEST", "1"), "{}", SzFlags::NO_FLAGS)
                .unwrap(),
            None
        );
    }

    #[test]
    fn unregistered_data_source_is_bad_input() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        let result = engine.add_record(&key("CUSTOMERS", "1"), "{}", SzFlags::NO_FLAGS);
        assert!(matches!(result, Err(SzError::BadInput(_))));

        repo.add_data_sources(&["CUSTOMERS"]);
        engine
            .add_record(&key("CUSTOMERS", "1"), "{}", SzFlags::NO_FLAGS)
            .unwrap();
    }

    #[test]
    fn mismatched_or_malformed_records_are_bad_input() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        for definition in [
            r#"{"DATA_SOURCE":"SEARCH"}"#,
            r#"{"RECORD_ID":"2"}"#,
            "[1,2]",
            "{not json",
        ] {
            let result = engine.add_record(&key("TEST", "1"), definition, SzFlags::NO_FLAGS);
            assert!(matches!(result, Err(SzError::BadInput(_))), "{definition}");
        }
    }

    #[test]
    fn missing_record_id_is_generated() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        let info = engine
            .add_record(
                &SzRecordKey::new("TEST", None),
                r#"{"NAME_FULL":"Anon"}"#,
                SzFlags::WITH_INFO,
            )
            .unwrap()
            .unwrap();
        let info: Value = serde_json::from_str(&info).unwrap();
        let generated = info["RECORD_ID"].as_str().unwrap().to_string();

        assert_eq!(generated.len(), 8);
        engine.get_record(&key("TEST", &generated)).unwrap();
    }

    #[test]
    fn replace_and_delete_queue_redo() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        engine.add_record(&key("TEST", "1"), "{}", SzFlags::NO_FLAGS).unwrap();
        assert_eq!(engine.count_redo_records().unwrap(), 0);

        engine
            .add_record(&key("TEST", "1"), r#"{"NAME_FULL":"B"}"#, SzFlags::NO_FLAGS)
            .unwrap();
        engine.delete_record(&key("TEST", "1"), SzFlags::NO_FLAGS).unwrap();
        assert_eq!(engine.count_redo_records().unwrap(), 2);

        let first: Value = serde_json::from_str(&engine.get_redo_record().unwrap().unwrap()).unwrap();
        assert_eq!(first["REASON"], REDO_REASON_REPLACED);
        let second = engine.get_redo_record().unwrap().unwrap();
        assert!(second.contains(REDO_REASON_DELETED));
        assert_eq!(engine.get_redo_record().unwrap(), None);

        let info = engine
            .process_redo_record(&second, SzFlags::WITH_INFO)
            .unwrap()
            .unwrap();
        assert!(info.contains(r#""AFFECTED_ENTITIES":[]"#));
        assert!(matches!(
            engine.get_record(&key("TEST", "1")),
            Err(SzError::NotFound(_))
        ));
    }

    #[test]
    fn search_matches_all_attributes() {
        let repo = TestRepository::new();
        let engine = repo.environment().engine();

        engine
            .add_record(
                &key("TEST", "1"),
                r#"{"NAME_FULL":"Joe Schmoe","PHONE_NUMBER":"702-555-1212"}"#,
                SzFlags::NO_FLAGS,
            )
            .unwrap();
        engine
            .add_record(
                &key("TEST", "2"),
                r#"{"NAME_FULL":"Jane Doe","PHONE_NUMBER":"702-555-1212"}"#,
                SzFlags::NO_FLAGS,
            )
            .unwrap();

        let found: Value = serde_json::from_str(
            &engine
                .search_by_attributes(r#"{"NAME_FULL":"joe schmoe","PHONE_NUMBER":"702-555-1212"}"#)
                .unwrap(),
        )
        .unwrap();
        let entities = found["RESOLVED_ENTITIES"].as_array().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(
            entities[0]["ENTITY"]["RESOLVED_ENTITY"]["RECORDS"][0]["RECORD_ID"],
            "1"
        );

        assert!(matches!(
            engine.search_by_attributes("{}"),
            Err(SzError::BadInput(_))
        ));
    }

    #[test]
    fn purge_keeps_configuration() {
        let repo = TestRepository::new();
        let env = repo.environment();
        let engine = env.engine();

        engine.add_record(&key("TEST", "1"), "{}", SzFlags::NO_FLAGS).unwrap();
        env.diagnostic().purge_repository().unwrap();

        assert!(matches!(
            engine.get_record(&key("TEST", "1")),
            Err(SzError::NotFound(_))
        ));
        assert!(env.config_manager().get_default_config_id().unwrap().is_some());
    }
}
