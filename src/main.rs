// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context};
use serde_json::Value;
use snippet_runner::catalog::SnippetCatalog;
use snippet_runner::cli::{usage, Selection};
use snippet_runner::config::consts::SETTINGS_ENV;
use snippet_runner::config::load_runner_config;
use snippet_runner::install::{InstallLocations, Platform, ProcessEnv};
use snippet_runner::observability;
use snippet_runner::repository::TempRepository;
use snippet_runner::runner::{ProcessExecutor, RunCoordinator, RunReport};
use snippet_runner::sdk::local::LocalEnvironmentFactory;
use snippet_runner::sdk::SzEnvironmentFactory;
use std::env;
use std::sync::Arc;

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    observability::init_tracing();

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> anyhow::Result<i32> {
    let args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .and_then(|arg| std::path::Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    let cwd = env::current_dir().context("Cannot determine the working directory")?;
    let config = load_runner_config(&cwd)?;
    let snippets_dir = config.snippets_dir(&cwd)?;
    let catalog = SnippetCatalog::build(&snippets_dir);

    if args.len() < 2 {
        eprint!("{}", usage(&program, &catalog));
        return Ok(1);
    }

    let settings = env::var(SETTINGS_ENV)
        .ok()
        .map(|settings| settings.trim().to_string())
        .filter(|settings| !settings.is_empty());
    if let Some(settings) = &settings {
        if !matches!(serde_json::from_str::<Value>(settings), Ok(Value::Object(_))) {
            eprintln!("The provided Senzing settings were not valid JSON:");
            eprintln!("{settings}");
            return Ok(1);
        }
    }

    let locations = match InstallLocations::discover(&ProcessEnv, Platform::current()) {
        Ok(locations) => locations,
        Err(e) => {
            eprintln!("{e}");
            return Ok(1);
        }
    };

    let selection = match Selection::resolve(&catalog, &args[1..]) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("{e}");
            return Ok(1);
        }
    };

    let factory: Arc<dyn SzEnvironmentFactory> = Arc::new(LocalEnvironmentFactory);

    // dropped at the end of this function, which deletes the database
    let mut repository = None;
    let (settings, default_config_id) = match settings {
        Some(settings) => {
            let default_config_id = read_default_config_id(factory.clone(), &settings).await?;
            (settings, default_config_id)
        }
        None => {
            let created = TempRepository::create(&locations, factory.as_ref())
                .context("Failed to create the temporary repository")?;
            println!("Created temporary repository: {}", created.path().display());
            let bootstrapped = (created.settings().to_string(), created.default_config_id());
            repository = Some(created);
            bootstrapped
        }
    };

    let executor = Arc::new(ProcessExecutor::new(
        config.launch.clone(),
        config.input_delay(),
        config.termination_grace(),
    ));
    let coordinator = RunCoordinator::new(
        factory,
        executor,
        settings,
        default_config_id,
        config.resources_dir(&snippets_dir),
        config.terminated_exit_code,
    );

    let cancel = coordinator.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = coordinator.run(&selection).await?;
    print_summary(&report);
    drop(repository);

    if report.interrupted {
        eprintln!("Run interrupted");
        return Ok(INTERRUPTED_EXIT_CODE);
    }
    Ok(0)
}

/// Default configuration of a repository the runner did not create.
async fn read_default_config_id(
    factory: Arc<dyn SzEnvironmentFactory>,
    settings: &str,
) -> anyhow::Result<i64> {
    let settings = settings.to_string();
    tokio::task::spawn_blocking(move || {
        factory
            .create(&settings)?
            .config_manager()
            .get_default_config_id()
    })
    .await??
    .ok_or_else(|| anyhow!("The repository has no default configuration"))
}

fn print_summary(report: &RunReport) {
    println!();
    println!("Snippet Results:");
    for result in &report.results {
        let note = if result.terminated { ", terminated" } else { "" };
        println!(
            "  - {} (exit {}{}, prepared {}ms, executed {}ms)",
            result.snippet,
            result.exit_code,
            note,
            result.preparation.as_millis(),
            result.execution.as_millis()
        );
    }
    println!(
        "Ran {} snippet(s) in {}ms",
        report.results.len(),
        report.total_duration().as_millis()
    );
}
