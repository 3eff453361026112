// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{LoadCounts, LoadStats, RetryTracker};
use crate::config::consts::DEFAULT_REDO_PAUSE_MS;
use crate::errors::{SzError, WorkloadError};
use crate::observability::messages::workload::{RedoFailed, RedoQueueIdle};
use crate::observability::messages::StructuredLog;
use crate::sdk::{SzEngine, SzFlags};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RedoOptions {
    /// Wait after finding the redo queue empty.
    pub pause: Duration,
    /// Stop after this many consecutive empty polls; `None` polls until cancelled.
    pub max_idle_polls: Option<usize>,
}

impl Default for RedoOptions {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(DEFAULT_REDO_PAUSE_MS),
            max_idle_polls: None,
        }
    }
}

async fn blocking<T, F>(call: F) -> Result<T, WorkloadError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| WorkloadError::Worker(e.to_string()))
}

/// Process redo records until cancelled or the queue stays empty.
pub async fn process_redo(
    engine: Arc<dyn SzEngine>,
    options: &RedoOptions,
    cancel: &CancellationToken,
    retry: &RetryTracker,
) -> Result<LoadCounts, WorkloadError> {
    let stats = LoadStats::default();
    let mut idle_polls = 0;

    while !cancel.is_cancelled() {
        let fetch = engine.clone();
        let next = blocking(move || fetch.get_redo_record()).await?;

        let redo = match next {
            Ok(Some(redo)) => redo,
            Ok(None) => {
                idle_polls += 1;
                RedoQueueIdle { idle_polls }.log();
                if options.max_idle_polls.is_some_and(|max| idle_polls >= max) {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(options.pause) => continue,
                    _ = cancel.cancelled() => break,
                }
            }
            Err(error) if error.is_retryable() => {
                RedoFailed {
                    redo: "<fetch>",
                    error: &error,
                }
                .log();
                tokio::select! {
                    _ = tokio::time::sleep(options.pause) => continue,
                    _ = cancel.cancelled() => break,
                }
            }
            Err(error) => return Err(WorkloadError::CriticalRedo(error)),
        };
        idle_polls = 0;

        let process = engine.clone();
        let (redo, result) = blocking(move || {
            let result = process.process_redo_record(&redo, SzFlags::NO_FLAGS);
            (redo, result)
        })
        .await?;

        match result {
            Ok(_) => stats.record_success(),
            Err(error) => {
                RedoFailed {
                    redo: &redo,
                    error: &error,
                }
                .log();
                match error {
                    SzError::BadInput(_) | SzError::NotFound(_) => stats.record_error(false),
                    SzError::Retryable(_) => {
                        stats.record_error(true);
                        retry.track(&redo)?;
                    }
                    critical => return Err(WorkloadError::CriticalRedo(critical)),
                }
            }
        }
    }

    Ok(stats.snapshot())
}
