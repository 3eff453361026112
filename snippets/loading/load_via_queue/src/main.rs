// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Loads a JSONL file with a reader task feeding a bounded queue.
//!
//! ```text
//! snippet-runner loading.load_via_queue
//! ```

use anyhow::Context;
use snippet_runner::config::consts::SETTINGS_ENV;
use snippet_runner::observability;
use snippet_runner::records::RecordLines;
use snippet_runner::sdk::local::LocalEnvironmentFactory;
use snippet_runner::sdk::SzEnvironmentFactory;
use snippet_runner::workload::{load_via_queue, LoadOptions, RetryTracker};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

const DEFAULT_INPUT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../../resources/data/load-records.jsonl"
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let settings = env::var(SETTINGS_ENV).with_context(|| format!("{SETTINGS_ENV} is not set"))?;
    let input = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
    let file = File::open(&input).with_context(|| format!("Cannot open {}", input.display()))?;

    let environment = LocalEnvironmentFactory.create(&settings)?;
    let retry = RetryTracker::new();
    let counts = load_via_queue(
        environment.engine(),
        RecordLines::new(BufReader::new(file)),
        &LoadOptions::default(),
        &retry,
    )
    .await?;

    println!();
    println!("Records successfully added : {}", counts.successes);
    println!("Records failed with errors : {}", counts.errors);
    if let Some(path) = retry.path() {
        println!("{} records to be retried in {}", counts.retries, path.display());
    }
    Ok(())
}
