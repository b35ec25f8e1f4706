// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job busy lock
//!
//! Two layers: an in-process table keyed by job id, and an exclusive
//! advisory lock on the job's `append.lock` for other processes.

use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Why a busy lock could not be taken
#[derive(Debug)]
pub(crate) enum AcquireError {
    Busy,
    Io(io::Error),
}

/// In-process table of jobs currently being executed
#[derive(Clone, Default)]
pub struct BusyLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl BusyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this process currently holds `job_id`
    pub fn is_held(&self, job_id: &str) -> bool {
        let held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.contains(job_id)
    }

    pub(crate) fn try_acquire(
        &self,
        job_id: &str,
        lock_path: &Path,
    ) -> Result<BusyGuard, AcquireError> {
        {
            let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
            if !held.insert(job_id.to_string()) {
                return Err(AcquireError::Busy);
            }
        }

        match Self::lock_file(lock_path) {
            Ok(file) => Ok(BusyGuard {
                job_id: job_id.to_string(),
                file,
                held: Arc::clone(&self.held),
            }),
            Err(e) => {
                self.release(job_id);
                Err(e)
            }
        }
    }

    fn lock_file(lock_path: &Path) -> Result<File, AcquireError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path)
            .map_err(AcquireError::Io)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(AcquireError::Busy),
            Err(e) => Err(AcquireError::Io(e)),
        }
    }

    fn release(&self, job_id: &str) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(job_id);
    }
}

/// Held busy lock; released on drop
pub(crate) struct BusyGuard {
    job_id: String,
    file: File,
    held: Arc<Mutex<HashSet<String>>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(job_id = %self.job_id, error = %e, "failed to release job lock file");
        }
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.job_id);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
