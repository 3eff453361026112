// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processes redo records until interrupted.
//!
//! Stops on SIGTERM or Ctrl-C and exits with 143 so the runner sees the
//! termination it asked for.

use anyhow::Context;
use snippet_runner::config::consts::{SETTINGS_ENV, TERMINATED_EXIT_CODE};
use snippet_runner::observability;
use snippet_runner::sdk::local::LocalEnvironmentFactory;
use snippet_runner::sdk::SzEnvironmentFactory;
use snippet_runner::workload::{process_redo, RedoOptions, RetryTracker};
use std::env;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    run(&cancel).await?;

    if cancel.is_cancelled() {
        std::process::exit(TERMINATED_EXIT_CODE);
    }
    Ok(())
}

async fn run(cancel: &CancellationToken) -> anyhow::Result<()> {
    let settings = env::var(SETTINGS_ENV).with_context(|| format!("{SETTINGS_ENV} is not set"))?;
    let environment = LocalEnvironmentFactory.create(&settings)?;
    let retry = RetryTracker::new();

    let counts = process_redo(environment.engine(), &RedoOptions::default(), cancel, &retry).await?;

    println!();
    println!("Redo records processed : {}", counts.successes);
    println!("Redo records failed    : {}", counts.errors);
    if let Some(path) = retry.path() {
        println!("{} redo records to be retried in {}", counts.retries, path.display());
    }
    Ok(())
}

#[cfg(unix)]
async fn cancel_on_shutdown(cancel: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = terminate.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
    cancel.cancel();
}

#[cfg(not(unix))]
async fn cancel_on_shutdown(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
    }
}
