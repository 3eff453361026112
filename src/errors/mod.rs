// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod install;
mod repository;
mod runner;
mod sdk;

pub use config::ConfigError;
pub use install::InstallError;
pub use repository::RepositoryError;
pub use runner::{CatalogError, PropertiesError, RunnerError, SelectionError, WorkloadError};
pub use sdk::{Severity, SzError};
