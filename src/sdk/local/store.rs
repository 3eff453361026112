// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SzError;
use crate::sdk::ConfigDocument;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONFIG_GROUP: &str = "CONFIG";
const DEFAULT_CONFIG_CODE: &str = "DEFAULT_CONFIG_ID";

const TABLES: &str = "
CREATE TABLE IF NOT EXISTS SZL_CONFIG (
    CONFIG_ID INTEGER PRIMARY KEY,
    CONFIG_DATA TEXT NOT NULL,
    CONFIG_COMMENTS TEXT,
    SYS_CREATE_DT TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS SZL_VARS (
    VAR_GROUP TEXT NOT NULL,
    VAR_CODE TEXT NOT NULL,
    VAR_VALUE TEXT,
    PRIMARY KEY (VAR_GROUP, VAR_CODE)
);
CREATE TABLE IF NOT EXISTS SZL_RECORD (
    ENTITY_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    DSRC_CODE TEXT NOT NULL,
    RECORD_ID TEXT NOT NULL,
    JSON_DATA TEXT NOT NULL,
    UNIQUE (DSRC_CODE, RECORD_ID)
);
CREATE TABLE IF NOT EXISTS SZL_REDO (
    REDO_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    REDO_DATA TEXT NOT NULL
);
";

impl From<rusqlite::Error> for SzError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                SzError::Retryable(error.to_string())
            }
            _ => SzError::Unrecoverable(error.to_string()),
        }
    }
}

/// Shared handle on the repository database.
#[derive(Clone)]
pub struct Store {
    connection: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, SzError> {
        let connection = Connection::open(path).map_err(|e| {
            SzError::Configuration(format!("cannot open repository {}: {e}", path.display()))
        })?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute_batch(TABLES)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, SzError> {
        self.connection
            .lock()
            .map_err(|_| SzError::Unrecoverable("repository connection lock poisoned".to_string()))
    }

    pub fn default_config_id(conn: &Connection) -> Result<Option<i64>, SzError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT VAR_VALUE FROM SZL_VARS WHERE VAR_GROUP = ?1 AND VAR_CODE = ?2",
                [DEFAULT_CONFIG_GROUP, DEFAULT_CONFIG_CODE],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    SzError::Unrecoverable(format!("corrupt default configuration id: {v}"))
                })
            })
            .transpose()
    }

    pub fn write_default_config_id(conn: &Connection, config_id: i64) -> Result<(), SzError> {
        conn.execute(
            "INSERT INTO SZL_VARS (VAR_GROUP, VAR_CODE, VAR_VALUE) VALUES (?1, ?2, ?3)
             ON CONFLICT (VAR_GROUP, VAR_CODE) DO UPDATE SET VAR_VALUE = excluded.VAR_VALUE",
            rusqlite::params![DEFAULT_CONFIG_GROUP, DEFAULT_CONFIG_CODE, config_id.to_string()],
        )?;
        Ok(())
    }

    pub fn config_data(conn: &Connection, config_id: i64) -> Result<Option<String>, SzError> {
        Ok(conn
            .query_row(
                "SELECT CONFIG_DATA FROM SZL_CONFIG WHERE CONFIG_ID = ?1",
                [config_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// The document records are validated against.
    pub fn active_config(conn: &Connection) -> Result<ConfigDocument, SzError> {
        let config_id = Self::default_config_id(conn)?.ok_or_else(|| {
            SzError::Configuration("no default configuration is registered".to_string())
        })?;
        let data = Self::config_data(conn, config_id)?.ok_or_else(|| {
            SzError::Configuration(format!("default configuration {config_id} is not registered"))
        })?;
        ConfigDocument::from_json(&data)
    }

    pub fn enqueue_redo(conn: &Connection, redo: &str) -> Result<(), SzError> {
        conn.execute("INSERT INTO SZL_REDO (REDO_DATA) VALUES (?1)", [redo])?;
        Ok(())
    }
}
