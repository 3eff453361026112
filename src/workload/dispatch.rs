// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{LoadCounts, LoadStats, RetryTracker};
use crate::errors::{SzError, WorkloadError};
use crate::observability::messages::workload::RecordFailed;
use crate::observability::messages::StructuredLog;
use crate::records::{parse_record, record_key};
use crate::sdk::{SzEngine, SzFlags};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

struct Attempt {
    line_number: usize,
    line: String,
    result: Result<(), SzError>,
}

fn add_line(engine: &dyn SzEngine, line: &str, default_source: &str) -> Result<(), SzError> {
    let record = parse_record(line)
        .ok_or_else(|| SzError::BadInput("record is not a JSON object".to_string()))?;
    engine.add_record(&record_key(&record, default_source), line, SzFlags::NO_FLAGS)?;
    Ok(())
}

/// Runs `add_record` calls on the blocking pool, at most `workers` at a time,
/// and applies the failure taxonomy to whatever finishes.
pub(super) struct Dispatcher<'a> {
    engine: Arc<dyn SzEngine>,
    permits: Arc<Semaphore>,
    pending: JoinSet<Attempt>,
    default_source: Arc<str>,
    stats: LoadStats,
    retry: &'a RetryTracker,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        engine: Arc<dyn SzEngine>,
        workers: usize,
        default_source: &str,
        retry: &'a RetryTracker,
    ) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(workers)),
            pending: JoinSet::new(),
            default_source: Arc::from(default_source),
            stats: LoadStats::default(),
            retry,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn submit(&mut self, line_number: usize, line: String) {
        let engine = self.engine.clone();
        let permits = self.permits.clone();
        let default_source = self.default_source.clone();

        self.pending.spawn(async move {
            // the semaphore is never closed
            let _permit = permits.acquire_owned().await.ok();
            let joined = tokio::task::spawn_blocking(move || {
                let result = add_line(engine.as_ref(), &line, &default_source);
                (line, result)
            })
            .await;

            match joined {
                Ok((line, result)) => Attempt {
                    line_number,
                    line,
                    result,
                },
                Err(e) => Attempt {
                    line_number,
                    line: String::new(),
                    result: Err(SzError::Unrecoverable(format!("engine call failed: {e}"))),
                },
            }
        });
    }

    /// Handle finished work without waiting.
    pub fn drain_ready(&mut self) -> Result<(), WorkloadError> {
        while let Some(joined) = self.pending.try_join_next() {
            self.handle(joined)?;
        }
        Ok(())
    }

    /// Wait for everything still pending.
    pub async fn drain_all(&mut self) -> Result<(), WorkloadError> {
        while let Some(joined) = self.pending.join_next().await {
            self.handle(joined)?;
        }
        Ok(())
    }

    pub fn finish(self) -> LoadCounts {
        self.stats.snapshot()
    }

    fn handle(&self, joined: Result<Attempt, JoinError>) -> Result<(), WorkloadError> {
        let attempt = joined.map_err(|e| WorkloadError::Worker(e.to_string()))?;
        match attempt.result {
            Ok(()) => {
                self.stats.record_success();
                Ok(())
            }
            Err(error) => record_failure(
                &self.stats,
                self.retry,
                attempt.line_number,
                &attempt.line,
                error,
            ),
        }
    }
}

/// Count a failed record, queue it for retry when retryable, and stop on
/// anything critical.
pub(super) fn record_failure(
    stats: &LoadStats,
    retry: &RetryTracker,
    line_number: usize,
    line: &str,
    error: SzError,
) -> Result<(), WorkloadError> {
    RecordFailed {
        severity: error.severity(),
        line_number,
        record: line,
        error: &error,
    }
    .log();

    match error {
        SzError::BadInput(_) | SzError::NotFound(_) => {
            stats.record_error(false);
            Ok(())
        }
        SzError::Retryable(_) => {
            stats.record_error(true);
            retry.track(line)
        }
        source => Err(WorkloadError::Critical {
            line_number,
            source,
        }),
    }
}
