// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod properties;

pub mod consts;

pub use loader::{load_config, load_runner_config, LaunchTemplate, RunnerConfig};
pub use properties::{parse_properties, SnippetProperties};
