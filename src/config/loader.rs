// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::catalog::SnippetEntry;
use crate::config::consts::{
    DEFAULT_INPUT_DELAY_MS, DEFAULT_TERMINATION_GRACE_MS, RUNNER_CONFIG_ENV, RUNNER_CONFIG_FILE,
    TERMINATED_EXIT_CODE,
};
use crate::errors::{CatalogError, ConfigError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runner configuration.
///
/// Every field is optional; a missing file is equivalent to an empty one.
///
/// # Example
/// ```yaml
/// snippets_dir: ./snippets
/// resources_dir: ./resources
/// launch: ["cargo", "run", "--quiet", "--manifest-path", "{manifest}"]
/// input_delay_ms: 1000
/// termination_grace_ms: 10000
/// terminated_exit_code: 143
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub snippets_dir: Option<PathBuf>,
    pub resources_dir: Option<PathBuf>,
    pub launch: LaunchTemplate,
    pub input_delay_ms: u64,
    pub termination_grace_ms: u64,
    pub terminated_exit_code: i32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            snippets_dir: None,
            resources_dir: None,
            launch: LaunchTemplate::default(),
            input_delay_ms: DEFAULT_INPUT_DELAY_MS,
            termination_grace_ms: DEFAULT_TERMINATION_GRACE_MS,
            terminated_exit_code: TERMINATED_EXIT_CODE,
        }
    }
}

impl RunnerConfig {
    pub fn input_delay(&self) -> Duration {
        Duration::from_millis(self.input_delay_ms)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_ms)
    }

    /// Locate the snippets directory.
    ///
    /// An explicit `snippets_dir` wins. Otherwise the working directory may be
    /// the snippets directory itself, its parent, or a sibling `runner`
    /// directory.
    pub fn snippets_dir(&self, cwd: &Path) -> Result<PathBuf, CatalogError> {
        if let Some(dir) = &self.snippets_dir {
            let dir = if dir.is_absolute() { dir.clone() } else { cwd.join(dir) };
            if !dir.is_dir() {
                return Err(CatalogError::MissingSnippetsDir(dir));
            }
            return Ok(dir);
        }

        let name = cwd.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name == "snippets" {
            return Ok(cwd.to_path_buf());
        }

        let child = cwd.join("snippets");
        if child.is_dir() {
            return Ok(child);
        }

        if name == "runner" {
            if let Some(sibling) = cwd.parent().map(|p| p.join("snippets")) {
                if sibling.is_dir() {
                    return Ok(sibling);
                }
            }
        }

        Err(CatalogError::WrongDirectory {
            cwd: cwd.to_path_buf(),
        })
    }

    /// Directory holding property files and load files, defaulting to a
    /// `resources` directory beside the snippets directory.
    pub fn resources_dir(&self, snippets_dir: &Path) -> PathBuf {
        match &self.resources_dir {
            Some(dir) => dir.clone(),
            None => snippets_dir
                .parent()
                .unwrap_or(snippets_dir)
                .join("resources"),
        }
    }
}

/// Command line used to launch a snippet.
///
/// Placeholders `{manifest}`, `{path}`, `{snippet}` and `{name}` are replaced
/// with the snippet's manifest path, directory, qualified name and bare name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LaunchTemplate(pub Vec<String>);

impl Default for LaunchTemplate {
    fn default() -> Self {
        Self(
            ["cargo", "run", "--quiet", "--manifest-path", "{manifest}"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl LaunchTemplate {
    /// Render the template for a snippet, returning the program and its arguments.
    pub fn render(&self, entry: &SnippetEntry) -> Option<(String, Vec<String>)> {
        let manifest = entry.manifest_path();
        let manifest = manifest.to_string_lossy();
        let path = entry.path.to_string_lossy();

        let mut parts = self.0.iter().map(|part| {
            part.replace("{manifest}", &manifest)
                .replace("{path}", &path)
                .replace("{snippet}", &entry.qualified_name)
                .replace("{name}", &entry.name)
        });

        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}

/// Load a runner config from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the runner config from `SNIPPET_RUNNER_CONFIG`, then
/// `snippet-runner.yaml` in `cwd`, falling back to defaults.
pub fn load_runner_config(cwd: &Path) -> Result<RunnerConfig, ConfigError> {
    if let Some(explicit) = std::env::var_os(RUNNER_CONFIG_ENV).filter(|v| !v.is_empty()) {
        return load_config(PathBuf::from(explicit));
    }

    let local = cwd.join(RUNNER_CONFIG_FILE);
    if local.is_file() {
        return load_config(local);
    }

    Ok(RunnerConfig::default())
}
