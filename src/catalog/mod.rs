// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Discovery of runnable snippets.
//!
//! Snippets live two levels below the snippets directory, as
//! `<group>/<snippet>/`. A snippet directory counts only when it holds a
//! `Cargo.toml` whose package is named after the directory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "Cargo.toml";

/// A single runnable snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetEntry {
    pub group: String,
    pub name: String,
    /// `<group>.<name>`
    pub qualified_name: String,
    pub path: PathBuf,
}

impl SnippetEntry {
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }
}

#[derive(Deserialize)]
struct Manifest {
    package: Package,
}

#[derive(Deserialize)]
struct Package {
    name: String,
}

/// Groups and snippets keyed for alphabetical iteration.
#[derive(Debug, Clone, Default)]
pub struct SnippetCatalog {
    groups: BTreeMap<String, BTreeMap<String, SnippetEntry>>,
}

impl SnippetCatalog {
    /// Scan `root`. Unreadable directories and non-snippet entries are skipped.
    pub fn build(root: &Path) -> Self {
        let mut groups = BTreeMap::new();

        for group_dir in subdirectories(root) {
            let Some(group) = dir_name(&group_dir) else {
                continue;
            };

            let snippets: BTreeMap<String, SnippetEntry> = subdirectories(&group_dir)
                .into_iter()
                .filter_map(|snippet_dir| {
                    let name = dir_name(&snippet_dir)?;
                    if !is_snippet(&snippet_dir, &name) {
                        return None;
                    }
                    let qualified_name = format!("{group}.{name}");
                    Some((
                        qualified_name.clone(),
                        SnippetEntry {
                            group: group.clone(),
                            name,
                            qualified_name,
                            path: snippet_dir,
                        },
                    ))
                })
                .collect();

            if !snippets.is_empty() {
                groups.insert(group, snippets);
            }
        }

        Self { groups }
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, SnippetEntry>)> {
        self.groups.iter().map(|(name, snippets)| (name.as_str(), snippets))
    }

    /// Every snippet, ordered by group then name.
    pub fn snippets(&self) -> impl Iterator<Item = &SnippetEntry> {
        self.groups.values().flat_map(|snippets| snippets.values())
    }

    pub fn group(&self, name: &str) -> Option<&BTreeMap<String, SnippetEntry>> {
        self.groups.get(name)
    }

    pub fn snippet(&self, qualified_name: &str) -> Option<&SnippetEntry> {
        self.groups
            .values()
            .find_map(|snippets| snippets.get(qualified_name))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect()
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

fn is_snippet(dir: &Path, name: &str) -> bool {
    fs::read_to_string(dir.join(MANIFEST_FILE))
        .ok()
        .and_then(|text| toml::from_str::<Manifest>(&text).ok())
        .map(|manifest| manifest.package.name == name)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snippet(root: &Path, group: &str, name: &str, package: &str) {
        let dir = root.join(group).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(MANIFEST_FILE),
            format!("[package]\nname = \"{package}\"\nversion = \"0.1.0\"\n"),
        )
        .unwrap();
    }

    #[test]
    fn builds_sorted_catalog() {
        let root = TempDir::new().unwrap();
        snippet(root.path(), "loading", "load_records", "load_records");
        snippet(root.path(), "loading", "load_via_futures", "load_via_futures");
        snippet(root.path(), "configuration", "add_data_sources", "add_data_sources");

        let catalog = SnippetCatalog::build(root.path());

        let groups: Vec<&str> = catalog.groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["configuration", "loading"]);

        let names: Vec<&str> = catalog.snippets().map(|s| s.qualified_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "configuration.add_data_sources",
                "loading.load_records",
                "loading.load_via_futures"
            ]
        );

        let entry = catalog.snippet("loading.load_records").unwrap();
        assert_eq!(entry.group, "loading");
        assert_eq!(entry.name, "load_records");
        assert_eq!(
            entry.manifest_path(),
            root.path().join("loading").join("load_records").join(MANIFEST_FILE)
        );
    }

    #[test]
    fn skips_directories_without_matching_manifest() {
        let root = TempDir::new().unwrap();
        snippet(root.path(), "loading", "renamed", "something_else");
        fs::create_dir_all(root.path().join("loading").join("no_manifest")).unwrap();

        let broken = root.path().join("loading").join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(MANIFEST_FILE), "not [ toml").unwrap();

        fs::write(root.path().join("README.md"), "").unwrap();

        let catalog = SnippetCatalog::build(root.path());
        assert!(catalog.is_empty());
        assert!(catalog.group("loading").is_none());
    }

    #[test]
    fn missing_root_is_empty() {
        let root = TempDir::new().unwrap();
        assert!(SnippetCatalog::build(&root.path().join("absent")).is_empty());
    }

    #[test]
    fn snippet_lookup_requires_qualified_name() {
        let root = TempDir::new().unwrap();
        snippet(root.path(), "redo", "redo_continuous", "redo_continuous");
        let catalog = SnippetCatalog::build(root.path());

        assert!(catalog.snippet("redo.redo_continuous").is_some());
        assert!(catalog.snippet("redo_continuous").is_none());
        assert!(catalog.snippet("other.redo_continuous").is_none());
    }
}
