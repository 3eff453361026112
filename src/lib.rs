// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod catalog;    // snippet discovery
pub mod cli;        // selection + usage
pub mod config;     // runner config + property files
pub mod errors;     // error handling
pub mod install;    // installation directory discovery
pub mod observability;
pub mod records;    // JSONL record input
pub mod repository; // temporary repository bootstrap
pub mod runner;     // snippet lifecycle
pub mod sdk;        // engine call contract + local binding
pub mod traits;     // unified abstractions
pub mod workload;   // bounded-concurrency engine workloads
