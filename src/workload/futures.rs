// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::dispatch::Dispatcher;
use super::{LoadCounts, LoadOptions, RetryTracker};
use crate::errors::WorkloadError;
use crate::sdk::SzEngine;
use std::io;
use std::sync::Arc;

/// Add every record line, keeping a bounded backlog of in-flight calls.
///
/// Finished calls are drained after each submission. When the backlog is
/// full, submission pauses for `options.pause` and drains again. All pending
/// calls are awaited before returning.
pub async fn load_via_futures<I>(
    engine: Arc<dyn SzEngine>,
    lines: I,
    options: &LoadOptions,
    retry: &RetryTracker,
) -> Result<LoadCounts, WorkloadError>
where
    I: IntoIterator<Item = io::Result<(usize, String)>>,
{
    let capacity = options.backlog();
    let mut dispatcher = Dispatcher::new(engine, options.workers(), &options.default_source, retry);

    for line in lines {
        let (line_number, line) = line.map_err(WorkloadError::Input)?;

        while dispatcher.pending() >= capacity {
            tokio::time::sleep(options.pause).await;
            dispatcher.drain_ready()?;
        }

        dispatcher.submit(line_number, line);
        dispatcher.drain_ready()?;
    }

    dispatcher.drain_all().await?;
    Ok(dispatcher.finish())
}
