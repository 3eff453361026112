// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded-concurrency engine workloads used by the demo snippets.
//!
//! Engine calls are synchronous, so every call runs on the blocking pool
//! while a tokio task keeps submission, draining and backpressure moving.
//! Failures follow the engine's taxonomy: bad input is counted and skipped,
//! retryable failures are counted and written to a [`RetryTracker`], and
//! anything else stops the workload.

mod dispatch;
mod futures;
mod queue;
mod redo;
mod retry;

pub use self::futures::load_via_futures;
pub use queue::load_via_queue;
pub use redo::{process_redo, RedoOptions};
pub use retry::RetryTracker;

use crate::config::consts::{
    DEFAULT_BACKLOG_FACTOR, DEFAULT_LOAD_PAUSE_MS, DEFAULT_WORKER_COUNT, PLACEHOLDER_DATA_SOURCE,
};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Engine calls in flight at once.
    pub workers: usize,
    /// Pending records allowed per worker before submission pauses.
    pub backlog_factor: usize,
    /// Wait before re-checking a full backlog.
    pub pause: Duration,
    /// Data source for records that do not name one.
    pub default_source: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            backlog_factor: DEFAULT_BACKLOG_FACTOR,
            pause: Duration::from_millis(DEFAULT_LOAD_PAUSE_MS),
            default_source: PLACEHOLDER_DATA_SOURCE.to_string(),
        }
    }
}

impl LoadOptions {
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn backlog(&self) -> usize {
        self.workers() * self.backlog_factor.max(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadCounts {
    pub successes: usize,
    pub errors: usize,
    /// Failures that were retryable; also counted in `errors`.
    pub retries: usize,
}

/// Shared workload counters.
#[derive(Debug, Default)]
pub struct LoadStats {
    counts: Mutex<LoadCounts>,
}

impl LoadStats {
    pub fn record_success(&self) {
        self.update(|counts| counts.successes += 1);
    }

    pub fn record_error(&self, retryable: bool) {
        self.update(|counts| {
            counts.errors += 1;
            if retryable {
                counts.retries += 1;
            }
        });
    }

    pub fn snapshot(&self) -> LoadCounts {
        *self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, apply: impl FnOnce(&mut LoadCounts)) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut *counts);
    }
}
