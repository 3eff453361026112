// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::runner::TerminationRequested;
use crate::observability::messages::StructuredLog;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

/// Decides when a running snippet must be stopped and stops it.
///
/// Fires when the optional deadline passes or the parent token is cancelled.
/// Stopping is graceful first: the snippet's process group gets `SIGTERM` and
/// `grace` to exit before everything is killed.
pub struct Termination {
    token: CancellationToken,
    grace: Duration,
}

impl Termination {
    pub fn new(parent: &CancellationToken, deadline: Option<Duration>, grace: Duration) -> Self {
        let token = parent.child_token();

        if let Some(deadline) = deadline {
            let timer = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => timer.cancel(),
                    _ = timer.cancelled() => {}
                }
            });
        }

        Self { token, grace }
    }

    /// Resolves once termination has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await
    }

    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop `child` unless it has already exited on its own.
    ///
    /// Returns the exit status and whether the runner had to terminate it. A
    /// child that exits successfully was not terminated.
    pub async fn stop(&self, child: &mut Child) -> io::Result<(ExitStatus, bool)> {
        if let Ok(Some(status)) = child.try_wait() {
            return Ok((status, false));
        }
        let status = self.terminate(child).await?;
        // a clean exit means the child finished before the signal landed
        Ok((status, !status.success()))
    }

    /// Stop `child` and wait for it to exit.
    pub async fn terminate(&self, child: &mut Child) -> io::Result<ExitStatus> {
        let pid = child.id();
        TerminationRequested { pid, forced: false }.log();
        request_exit(child, pid);

        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                TerminationRequested { pid, forced: true }.log();
                force_exit(child, pid);
                child.wait().await
            }
        }
    }
}

impl Drop for Termination {
    fn drop(&mut self) {
        // stops the deadline timer; the parent token is unaffected
        self.token.cancel();
    }
}

#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: libc::c_int) -> bool {
    let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return false;
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    unsafe { libc::kill(-pgid, signal) == 0 }
}

#[cfg(unix)]
fn request_exit(child: &mut Child, pid: Option<u32>) {
    if !signal_group(pid, libc::SIGTERM) {
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child, _pid: Option<u32>) {
    let _ = child.start_kill();
}

fn force_exit(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    signal_group(pid, libc::SIGKILL);
    #[cfg(not(unix))]
    let _ = pid;

    let _ = child.start_kill();
}

/// Exit code of a finished process; death by signal N is `128 + N`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
