// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Command line selection and usage text.

use crate::catalog::{SnippetCatalog, SnippetEntry};
use crate::errors::SelectionError;
use std::collections::HashSet;
use std::fmt::Write;

pub const ALL_TOKEN: &str = "all";

/// Snippets chosen on the command line, in first-seen order without duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    entries: Vec<SnippetEntry>,
}

impl Selection {
    /// Expand `all`, group names and qualified snippet names.
    ///
    /// A token naming both a group and a snippet selects the group.
    pub fn resolve<S: AsRef<str>>(
        catalog: &SnippetCatalog,
        tokens: &[S],
    ) -> Result<Self, SelectionError> {
        let mut selection = Self::default();
        let mut seen = HashSet::new();

        for token in tokens.iter().map(AsRef::as_ref) {
            if token == ALL_TOKEN {
                for entry in catalog.snippets() {
                    selection.push(&mut seen, entry);
                }
            } else if let Some(group) = catalog.group(token) {
                for entry in group.values() {
                    selection.push(&mut seen, entry);
                }
            } else if let Some(entry) = catalog.snippet(token) {
                selection.push(&mut seen, entry);
            } else {
                return Err(SelectionError::Unrecognized(token.to_string()));
            }
        }

        Ok(selection)
    }

    fn push(&mut self, seen: &mut HashSet<String>, entry: &SnippetEntry) {
        if seen.insert(entry.qualified_name.clone()) {
            self.entries.push(entry.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnippetEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.qualified_name.as_str())
            .collect()
    }
}

/// Usage text listing every group and snippet in `catalog`.
pub fn usage(program: &str, catalog: &SnippetCatalog) -> String {
    let mut text = String::new();
    let example: Vec<&str> = catalog
        .snippets()
        .take(2)
        .map(|entry| entry.qualified_name.as_str())
        .collect();
    let first_group = catalog.groups().next().map(|(name, _)| name);

    let _ = writeln!(text, "{program} [ {ALL_TOKEN} | <group> | <snippet> ]*");
    let _ = writeln!(text);
    let _ = writeln!(text, "  - Specifying no arguments will print this message");
    let _ = writeln!(text, "  - Specifying \"{ALL_TOKEN}\" will run all snippets");
    let _ = writeln!(
        text,
        "  - Specifying one or more groups will run all snippets in those groups"
    );
    let _ = writeln!(text, "  - Specifying one or more snippets will run those snippets");
    let _ = writeln!(text);
    let _ = writeln!(text, "Examples:");
    let _ = writeln!(text);
    let _ = writeln!(text, "  {program} {ALL_TOKEN}");
    if !example.is_empty() {
        let _ = writeln!(text);
        let _ = writeln!(text, "  {program} {}", example.join(" "));
    }
    if let (Some(group), Some(snippet)) = (first_group, example.last()) {
        let _ = writeln!(text);
        let _ = writeln!(text, "  {program} {group} {snippet}");
    }
    let _ = writeln!(text);

    let _ = writeln!(text, "Snippet Group Names:");
    for (group, _) in catalog.groups() {
        let _ = writeln!(text, "  - {group}");
    }
    let _ = writeln!(text);

    let _ = writeln!(text, "Snippet Names:");
    for entry in catalog.snippets() {
        let _ = writeln!(text, "  - {}", entry.qualified_name);
    }
    text
}
