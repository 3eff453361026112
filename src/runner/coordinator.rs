// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::prepare::{prepare_repository, PreparationPlan};
use super::RunPhase;
use crate::catalog::SnippetEntry;
use crate::cli::Selection;
use crate::config::SnippetProperties;
use crate::errors::RunnerError;
use crate::observability::messages::runner::{
    PhaseEntered, SnippetCompleted, SnippetFailed, SnippetRunStarted,
};
use crate::observability::messages::StructuredLog;
use crate::sdk::SzEnvironmentFactory;
use crate::traits::{ExecutionRequest, SnippetExecutor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of one snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub snippet: String,
    pub preparation: Duration,
    pub execution: Duration,
    pub exit_code: i32,
    pub terminated: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: Vec<RunResult>,
    /// The run was cancelled; later snippets were skipped.
    pub interrupted: bool,
}

impl RunReport {
    pub fn total_duration(&self) -> Duration {
        self.results
            .iter()
            .map(|result| result.preparation + result.execution)
            .sum()
    }
}

/// Runs a selection of snippets one after another.
pub struct RunCoordinator {
    factory: Arc<dyn SzEnvironmentFactory>,
    executor: Arc<dyn SnippetExecutor>,
    settings: String,
    default_config_id: i64,
    resources_dir: PathBuf,
    terminated_exit_code: i32,
    cancel: CancellationToken,
}

impl RunCoordinator {
    pub fn new(
        factory: Arc<dyn SzEnvironmentFactory>,
        executor: Arc<dyn SnippetExecutor>,
        settings: String,
        default_config_id: i64,
        resources_dir: PathBuf,
        terminated_exit_code: i32,
    ) -> Self {
        Self {
            factory,
            executor,
            settings,
            default_config_id,
            resources_dir,
            terminated_exit_code,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the run; cancelling it terminates the running snippet.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(&self, selection: &Selection) -> Result<RunReport, RunnerError> {
        let mut report = RunReport::default();

        for entry in selection.iter() {
            if self.cancel.is_cancelled() {
                break;
            }

            let span = PhaseEntered {
                snippet: &entry.qualified_name,
                phase: RunPhase::Preparing,
            }
            .span("snippet");
            let result = self.run_snippet(entry).instrument(span).await;

            match result {
                Ok(result) => report.results.push(result),
                Err((phase, error)) => {
                    SnippetFailed {
                        snippet: &entry.qualified_name,
                        phase,
                        error: &error,
                    }
                    .log();
                    return Err(error);
                }
            }
        }

        report.interrupted = self.cancel.is_cancelled();
        Ok(report)
    }

    async fn run_snippet(&self, entry: &SnippetEntry) -> Result<RunResult, (RunPhase, RunnerError)> {
        let snippet = entry.qualified_name.clone();
        let properties = SnippetProperties::load(
            &self.resources_dir.join(format!("{snippet}.properties")),
        )
        .map_err(|e| (RunPhase::Preparing, RunnerError::from(e)))?;

        SnippetRunStarted {
            snippet: &snippet,
            sources: properties.sources.len(),
            loads: properties.loads.len(),
            inputs: properties.inputs.len(),
        }
        .log();

        println!();
        println!("Preparing repository for {snippet}...");
        let started = Instant::now();
        let plan = PreparationPlan {
            snippet: snippet.clone(),
            properties: properties.clone(),
            resources_dir: self.resources_dir.clone(),
            default_config_id: self.default_config_id,
        };
        let factory = self.factory.clone();
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            let env = factory.create(&settings).map_err(|source| RunnerError::Engine {
                snippet: plan.snippet.clone(),
                phase: RunPhase::Preparing,
                source,
            })?;
            prepare_repository(env.as_ref(), &plan)
        })
        .await
        .map_err(|e| {
            (
                RunPhase::Preparing,
                RunnerError::Task {
                    snippet: snippet.clone(),
                    message: e.to_string(),
                },
            )
        })?
        .map_err(|e| {
            let phase = match &e {
                RunnerError::Engine { phase, .. } => *phase,
                _ => RunPhase::Loading,
            };
            (phase, e)
        })?;
        let preparation = started.elapsed();
        println!(
            "Prepared repository for {snippet}. ({}ms)",
            preparation.as_millis()
        );

        PhaseEntered {
            snippet: &snippet,
            phase: RunPhase::Executing,
        }
        .log();
        println!("Executing {snippet}...");
        let started = Instant::now();
        let request = ExecutionRequest {
            entry,
            settings: &self.settings,
            inputs: &properties.inputs,
            destroy_after: properties.destroy_after,
        };
        let outcome = self
            .executor
            .execute(request, self.cancel.child_token())
            .await
            .map_err(|e| (RunPhase::Executing, e))?;
        let execution = started.elapsed();

        let expected = if outcome.terminated {
            self.terminated_exit_code
        } else {
            0
        };
        if outcome.exit_code != expected {
            return Err((
                RunPhase::Executing,
                RunnerError::UnexpectedExitCode {
                    snippet,
                    expected,
                    actual: outcome.exit_code,
                },
            ));
        }

        println!("Executed {snippet}. ({}ms)", execution.as_millis());
        SnippetCompleted {
            snippet: &snippet,
            exit_code: outcome.exit_code,
            terminated: outcome.terminated,
            duration: preparation + execution,
        }
        .log();
        PhaseEntered {
            snippet: &snippet,
            phase: RunPhase::Completed,
        }
        .log();

        Ok(RunResult {
            snippet,
            preparation,
            execution,
            exit_code: outcome.exit_code,
            terminated: outcome.terminated,
        })
    }
}
