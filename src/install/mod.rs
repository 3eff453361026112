// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Discovery of the engine installation directories.
//!
//! Every directory can be overridden by an environment variable. Explicit
//! overrides are validated strictly; implicitly derived directories fall back
//! quietly or are dropped.

mod env;

pub use env::{EnvSource, Platform, ProcessEnv};

use crate::config::consts::{
    CONFIG_DIR_ENV, INSTALL_DIR_ENV, REQUIRED_CONFIG_FILES, RESOURCE_DIR_ENV, SUPPORT_DIR_ENV,
    TEMPLATES_DIR,
};
use crate::errors::InstallError;
use crate::observability::messages::install::{ImplicitPathDiscarded, LocationsResolved};
use crate::observability::messages::StructuredLog;
use std::fmt;
use std::path::{Path, PathBuf};

const DEV_BUILD_DIR_NAME: &str = "dist";
const INSTALL_PARENT_NAME: &str = "senzing";

/// Resolved installation paths. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLocations {
    install_dir: PathBuf,
    config_dir: Option<PathBuf>,
    support_dir: PathBuf,
    resource_dir: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    development_build: bool,
}

impl InstallLocations {
    pub fn discover(env: &impl EnvSource, platform: Platform) -> Result<Self, InstallError> {
        let install_dir = resolve_install_dir(env, platform)?;
        let development_build = install_dir
            .file_name()
            .map(|name| name == DEV_BUILD_DIR_NAME)
            .unwrap_or(false);

        let support_dir = resolve_support_dir(env, platform, &install_dir, development_build)?;
        let config_dir =
            resolve_config_dir(env, platform, &install_dir, &support_dir, development_build)?;
        let (resource_dir, templates_dir) = resolve_resource_dir(env, &install_dir)?;

        let locations = Self {
            install_dir,
            config_dir,
            support_dir,
            resource_dir,
            templates_dir,
            development_build,
        };
        LocationsResolved {
            locations: &locations,
        }
        .log();
        Ok(locations)
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn support_dir(&self) -> &Path {
        &self.support_dir
    }

    pub fn resource_dir(&self) -> Option<&Path> {
        self.resource_dir.as_deref()
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    pub fn is_development_build(&self) -> bool {
        self.development_build
    }
}

impl fmt::Display for InstallLocations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(path: Option<&Path>) -> String {
            path.map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        }

        write!(f, "\n    Installation Directory  : {}", self.install_dir.display())?;
        write!(f, "\n    Support Directory       : {}", self.support_dir.display())?;
        write!(f, "\n    Config Directory        : {}", show(self.config_dir()))?;
        write!(f, "\n    Resource Directory      : {}", show(self.resource_dir()))?;
        write!(f, "\n    Templates Directory     : {}", show(self.templates_dir()))?;
        write!(f, "\n    Development Build       : {}", self.development_build)
    }
}

fn install_hint(explicit: bool) -> String {
    if explicit {
        format!("check the {INSTALL_DIR_ENV} environment variable")
    } else {
        format!("set {INSTALL_DIR_ENV} to the installation directory")
    }
}

fn resolve_install_dir(env: &impl EnvSource, platform: Platform) -> Result<PathBuf, InstallError> {
    let explicit = env.path(INSTALL_DIR_ENV);
    let is_explicit = explicit.is_some();
    let mut path = explicit.unwrap_or_else(|| platform.default_install_dir());

    if !path.exists() {
        return Err(InstallError::InstallDirNotFound {
            path,
            hint: install_hint(is_explicit),
        });
    }

    let named_parent = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.eq_ignore_ascii_case(INSTALL_PARENT_NAME))
        .unwrap_or(false);
    if path.is_dir() && named_parent {
        path = path.join("er");
    }

    if !path.is_dir() {
        return Err(InstallError::InstallDirInvalid {
            path,
            hint: install_hint(is_explicit),
        });
    }
    Ok(path)
}

fn resolve_support_dir(
    env: &impl EnvSource,
    platform: Platform,
    install_dir: &Path,
    development_build: bool,
) -> Result<PathBuf, InstallError> {
    let explicit = env.path(SUPPORT_DIR_ENV);
    let hint = if explicit.is_some() {
        format!("check the {SUPPORT_DIR_ENV} environment variable")
    } else {
        format!("set {SUPPORT_DIR_ENV} to the support directory")
    };

    let path = match explicit {
        Some(path) => path,
        None if development_build => install_dir.join("data"),
        None => platform.default_support_dir(),
    };

    if !path.exists() {
        return Err(InstallError::SupportDirNotFound { path, hint });
    }
    if !path.is_dir() {
        return Err(InstallError::SupportDirInvalid { path, hint });
    }
    Ok(path)
}

fn resolve_config_dir(
    env: &impl EnvSource,
    platform: Platform,
    install_dir: &Path,
    support_dir: &Path,
    development_build: bool,
) -> Result<Option<PathBuf>, InstallError> {
    if let Some(path) = env.path(CONFIG_DIR_ENV) {
        if !path.exists() {
            return Err(InstallError::ConfigDirNotFound {
                variable: CONFIG_DIR_ENV,
                path,
            });
        }
        if !path.is_dir() {
            return Err(InstallError::ConfigDirNotDirectory {
                variable: CONFIG_DIR_ENV,
                path,
            });
        }

        let missing: Vec<String> = REQUIRED_CONFIG_FILES
            .iter()
            .filter(|file| !path.join(file).exists() && !support_dir.join(file).exists())
            .map(|file| file.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InstallError::ConfigDirIncomplete {
                variable: CONFIG_DIR_ENV,
                path,
                missing,
            });
        }
        return Ok(Some(path));
    }

    if development_build {
        return Ok(Some(install_dir.join("data")));
    }

    let fallback = platform
        .default_config_dir()
        .filter(|dir| dir.is_dir())
        .or_else(|| Some(install_dir.join("etc")).filter(|dir| dir.is_dir()));
    Ok(fallback)
}

fn resolve_resource_dir(
    env: &impl EnvSource,
    install_dir: &Path,
) -> Result<(Option<PathBuf>, Option<PathBuf>), InstallError> {
    match env.path(RESOURCE_DIR_ENV) {
        Some(path) => {
            if !path.exists() {
                return Err(InstallError::ResourceDirNotFound {
                    variable: RESOURCE_DIR_ENV,
                    path,
                });
            }
            let templates = path.join(TEMPLATES_DIR);
            if !path.is_dir() || !templates.is_dir() {
                return Err(InstallError::ResourceDirInvalid {
                    variable: RESOURCE_DIR_ENV,
                    path,
                });
            }
            Ok((Some(path), Some(templates)))
        }
        None => {
            let path = install_dir.join("resources");
            let templates = path.join(TEMPLATES_DIR);
            if path.is_dir() && templates.is_dir() {
                Ok((Some(path), Some(templates)))
            } else {
                ImplicitPathDiscarded {
                    kind: "resource",
                    path: &path,
                }
                .log();
                Ok((None, None))
            }
        }
    }
}
