// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::termination::{exit_code, Termination};
use crate::config::consts::SETTINGS_ENV;
use crate::config::LaunchTemplate;
use crate::errors::RunnerError;
use crate::observability::messages::runner::SnippetExecuting;
use crate::observability::messages::StructuredLog;
use crate::traits::{ExecutionOutcome, ExecutionRequest, SnippetExecutor};
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio_util::sync::CancellationToken;

/// Runs snippets as child processes built from a [`LaunchTemplate`].
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    launch: LaunchTemplate,
    input_delay: Duration,
    termination_grace: Duration,
}

impl ProcessExecutor {
    pub fn new(launch: LaunchTemplate, input_delay: Duration, termination_grace: Duration) -> Self {
        Self {
            launch,
            input_delay,
            termination_grace,
        }
    }
}

/// Echo and write each input line, then leave the pipe open.
async fn feed_input(
    stdin: Option<&mut ChildStdin>,
    inputs: &[String],
    delay: Duration,
) -> io::Result<()> {
    let Some(stdin) = stdin else {
        return Ok(());
    };

    tokio::time::sleep(delay).await;
    for line in inputs {
        println!("{line}");
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
    }
    Ok(())
}

#[async_trait]
impl SnippetExecutor for ProcessExecutor {
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, RunnerError> {
        let snippet = request.entry.qualified_name.as_str();
        let (program, args) = self
            .launch
            .render(request.entry)
            .ok_or(RunnerError::EmptyLaunchCommand)?;

        let mut command = Command::new(&program);
        command
            .args(&args)
            .env(SETTINGS_ENV, request.settings)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if request.inputs.is_empty() {
            command.stdin(Stdio::null());
        } else {
            command.stdin(Stdio::piped());
        }
        #[cfg(unix)]
        command.process_group(0);

        SnippetExecuting {
            snippet,
            program: &program,
        }
        .log();
        let mut child = command.spawn().map_err(|source| RunnerError::Launch {
            snippet: snippet.to_string(),
            source,
        })?;

        let termination = Termination::new(&cancel, request.destroy_after, self.termination_grace);
        let mut stdin = child.stdin.take();
        let feed = feed_input(stdin.as_mut(), request.inputs, self.input_delay);
        tokio::pin!(feed);
        let mut feeding = !request.inputs.is_empty();

        let exited = loop {
            tokio::select! {
                biased;
                status = child.wait() => break Some(status),
                fed = &mut feed, if feeding => {
                    feeding = false;
                    match fed {
                        Ok(()) => {}
                        // the snippet closed its stdin; its exit code decides the outcome
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                        Err(source) => {
                            return Err(RunnerError::Input {
                                snippet: snippet.to_string(),
                                source,
                            })
                        }
                    }
                }
                _ = termination.requested() => break None,
            }
        };

        let stopped = match exited {
            Some(status) => status.map(|status| (status, false)),
            None => {
                println!("Runner destroying {snippet} process...");
                termination.stop(&mut child).await
            }
        };
        let (status, terminated) = stopped.map_err(|source| RunnerError::Launch {
            snippet: snippet.to_string(),
            source,
        })?;

        Ok(ExecutionOutcome {
            exit_code: exit_code(status),
            terminated,
        })
    }
}
