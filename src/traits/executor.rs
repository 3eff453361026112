// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::catalog::SnippetEntry;
use crate::errors::RunnerError;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything needed to run one snippet against a prepared repository.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub entry: &'a SnippetEntry,
    /// Settings JSON handed to the snippet through its environment.
    pub settings: &'a str,
    /// Lines to write to the snippet's stdin.
    pub inputs: &'a [String],
    /// Terminate the snippet once it has run this long.
    pub destroy_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Exit code, or `128 + N` when the snippet died from signal N.
    pub exit_code: i32,
    /// The runner terminated the snippet.
    pub terminated: bool,
}

#[async_trait]
pub trait SnippetExecutor: Send + Sync {
    /// Run the snippet to completion.
    ///
    /// Cancelling `cancel` terminates the snippet the same way an expired
    /// `destroy_after` deadline does.
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, RunnerError>;
}
