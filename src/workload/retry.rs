// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{RETRY_FILE_PREFIX, RETRY_FILE_SUFFIX};
use crate::errors::WorkloadError;
use crate::observability::messages::workload::RetryFileOpened;
use crate::observability::messages::StructuredLog;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

struct RetryFile {
    path: PathBuf,
    file: File,
    count: usize,
}

/// Collects inputs that failed with a retryable error.
///
/// The `retry-*.jsonl` file is created on first use and kept afterwards so
/// the inputs can be replayed.
pub struct RetryTracker {
    dir: Option<PathBuf>,
    file: Mutex<Option<RetryFile>>,
}

impl Default for RetryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryTracker {
    /// Retry file goes to the system temp directory.
    pub fn new() -> Self {
        Self {
            dir: None,
            file: Mutex::new(None),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
            file: Mutex::new(None),
        }
    }

    pub fn track(&self, input: &str) -> Result<(), WorkloadError> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        if let Some(retry) = guard.as_mut() {
            writeln!(retry.file, "{input}").map_err(WorkloadError::RetryFile)?;
            retry.count += 1;
        }
        Ok(())
    }

    /// Path of the retry file, once something has been tracked.
    pub fn path(&self) -> Option<PathBuf> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|retry| retry.path.clone())
    }

    pub fn count(&self) -> usize {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|retry| retry.count)
            .unwrap_or(0)
    }

    fn open(&self) -> Result<RetryFile, WorkloadError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(RETRY_FILE_PREFIX).suffix(RETRY_FILE_SUFFIX);
        let temp = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(WorkloadError::RetryFile)?;

        let (file, path) = temp
            .keep()
            .map_err(|e| WorkloadError::RetryFile(e.error))?;
        RetryFileOpened { path: &path }.log();
        Ok(RetryFile {
            path,
            file,
            count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_is_created_lazily_and_kept() {
        let dir = TempDir::new().unwrap();
        let tracker = RetryTracker::in_dir(dir.path());
        assert_eq!(tracker.path(), None);

        tracker.track(r#"{"RECORD_ID":"1"}"#).unwrap();
        tracker.track(r#"{"RECORD_ID":"2"}"#).unwrap();

        let path = tracker.path().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(RETRY_FILE_PREFIX));
        assert!(name.ends_with(RETRY_FILE_SUFFIX));
        assert_eq!(tracker.count(), 2);

        drop(tracker);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"RECORD_ID\":\"1\"}\n{\"RECORD_ID\":\"2\"}\n");
    }
}
