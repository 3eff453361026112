// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-snippet property files.
//!
//! The on-disk format is line oriented `key=value` with `#`/`!` comments and
//! trailing-backslash continuations. Indexed key families (`source.0`,
//! `source.1`, ...) are folded into ordered lists on [`SnippetProperties`].

use crate::config::consts::{
    DESTROY_AFTER_KEY, INPUT_KEY_PREFIX, LOAD_KEY_PREFIX, SOURCE_KEY_PREFIX,
};
use crate::errors::PropertiesError;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Typed view of a snippet's property file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetProperties {
    /// Data sources to register before the snippet runs.
    pub sources: Vec<String>,
    /// JSONL files to preload, relative to the resources directory.
    pub loads: Vec<String>,
    /// Lines written to the snippet's stdin after startup.
    pub inputs: Vec<String>,
    /// Terminate the snippet once this much time has passed.
    pub destroy_after: Option<Duration>,
}

impl SnippetProperties {
    /// Load from a file; a file that does not exist yields empty properties.
    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(PropertiesError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let raw = parse_properties(text);

        let destroy_after = match raw.get(DESTROY_AFTER_KEY) {
            Some(value) => {
                let millis = value.trim().parse::<u64>().map_err(|_| {
                    PropertiesError::InvalidDestroyAfter {
                        value: value.clone(),
                    }
                })?;
                Some(Duration::from_millis(millis))
            }
            None => None,
        };

        Ok(Self {
            sources: indexed_family(&raw, SOURCE_KEY_PREFIX),
            loads: indexed_family(&raw, LOAD_KEY_PREFIX),
            inputs: indexed_family(&raw, INPUT_KEY_PREFIX),
            destroy_after,
        })
    }
}

/// Collect `prefix.0`, `prefix.1`, ... stopping at the first missing index.
fn indexed_family(raw: &HashMap<String, String>, prefix: &str) -> Vec<String> {
    (0..)
        .map(|index| raw.get(&format!("{prefix}{index}")))
        .take_while(Option::is_some)
        .flatten()
        .map(|value| value.trim().to_string())
        .collect()
}

/// Parse property text into a flat key/value map.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut properties = HashMap::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let index = match trimmed.find('=') {
            Some(index) if index >= 1 => index,
            _ => continue,
        };

        let key = unescape(trimmed[..index].trim());
        let mut value = trimmed[index + 1..].trim().to_string();

        while continues(&value) {
            value.pop();
            match lines.next() {
                Some(next) => value.push_str(next.trim()),
                None => break,
            }
        }

        properties.insert(key, unescape(&value));
    }

    properties
}

/// An odd run of trailing backslashes joins the next line; an even run is
/// escaped backslashes.
fn continues(value: &str) -> bool {
    value.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Resolve `\t`, `\n`, `\r`, `\f`, `\uXXXX` and `\<char>` escapes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = Some(&hex)
                    .filter(|hex| hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
