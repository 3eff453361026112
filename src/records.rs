// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Line-oriented JSON record input.

use crate::config::consts::{DATA_SOURCE_FIELD, RECORD_ID_FIELD};
use crate::sdk::SzRecordKey;
use serde_json::{Map, Value};
use std::io::{self, BufRead};

/// Iterates the record lines of a JSONL source with 1-based line numbers.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Reading stops
/// at the first I/O error, which is yielded once.
pub struct RecordLines<R> {
    lines: io::Lines<R>,
    line_number: usize,
    failed: bool,
}

impl<R: BufRead> RecordLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordLines<R> {
    type Item = io::Result<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Some(Ok((self.line_number, trimmed.to_string())));
        }
    }
}

/// Parse a line as a JSON object.
pub fn parse_record(line: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(line) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

/// Key for a parsed record; `default_source` stands in for a missing or
/// empty `DATA_SOURCE`.
pub fn record_key(record: &Map<String, Value>, default_source: &str) -> SzRecordKey {
    let data_source = record
        .get(DATA_SOURCE_FIELD)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|ds| !ds.is_empty())
        .unwrap_or(default_source);

    let record_id = match record.get(RECORD_ID_FIELD) {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    SzRecordKey::new(data_source, record_id)
}
