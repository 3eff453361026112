// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::dispatch::Dispatcher;
use super::{LoadCounts, LoadOptions, RetryTracker};
use crate::errors::WorkloadError;
use crate::sdk::SzEngine;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Add every record line, reading input on a producer task.
///
/// The producer fills a bounded queue sized to the backlog and raises a
/// completion flag when input runs out. The consumer polls the queue with a
/// timeout and stops once the flag is set and the queue is empty.
pub async fn load_via_queue<I>(
    engine: Arc<dyn SzEngine>,
    lines: I,
    options: &LoadOptions,
    retry: &RetryTracker,
) -> Result<LoadCounts, WorkloadError>
where
    I: IntoIterator<Item = io::Result<(usize, String)>>,
    I::IntoIter: Send + 'static,
{
    let capacity = options.backlog();
    let (tx, mut rx) = mpsc::channel(capacity);
    let done = Arc::new(AtomicBool::new(false));

    let producer_done = done.clone();
    let lines = lines.into_iter();
    let producer = tokio::task::spawn_blocking(move || {
        for line in lines {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
        producer_done.store(true, Ordering::Release);
    });

    let mut dispatcher = Dispatcher::new(engine, options.workers(), &options.default_source, retry);
    loop {
        match tokio::time::timeout(options.pause, rx.recv()).await {
            Ok(Some(line)) => {
                let (line_number, line) = line.map_err(WorkloadError::Input)?;
                while dispatcher.pending() >= capacity {
                    tokio::time::sleep(options.pause).await;
                    dispatcher.drain_ready()?;
                }
                dispatcher.submit(line_number, line);
                dispatcher.drain_ready()?;
            }
            Ok(None) => break,
            Err(_) => {
                dispatcher.drain_ready()?;
                if done.load(Ordering::Acquire) && rx.is_empty() {
                    break;
                }
            }
        }
    }

    dispatcher.drain_all().await?;
    producer
        .await
        .map_err(|e| WorkloadError::Worker(e.to_string()))?;
    Ok(dispatcher.finish())
}
