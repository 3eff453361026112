// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::PathBuf;

/// Source of environment variables for discovery.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    /// The variable as a path; empty or whitespace-only values are absent.
    fn path(&self, name: &str) -> Option<PathBuf> {
        self.var(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }
}

/// The current process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Unix
        }
    }

    pub fn default_install_dir(self) -> PathBuf {
        match self {
            Platform::Windows => PathBuf::from(r"C:\Program Files\Senzing\er"),
            Platform::MacOs | Platform::Unix => PathBuf::from("/opt/senzing/er"),
        }
    }

    pub fn default_config_dir(self) -> Option<PathBuf> {
        match self {
            Platform::Unix => Some(PathBuf::from("/etc/opt/senzing")),
            Platform::Windows | Platform::MacOs => None,
        }
    }

    /// Fixed per platform; `SENZING_DIR` does not move it.
    pub fn default_support_dir(self) -> PathBuf {
        match self {
            Platform::Windows => PathBuf::from(r"C:\Program Files\Senzing\er\data"),
            Platform::MacOs => PathBuf::from("/opt/senzing/er/data"),
            Platform::Unix => PathBuf::from("/opt/senzing/data"),
        }
    }
}
