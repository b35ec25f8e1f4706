// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job store: per-job directories, the in-memory index and write leases
//!
//! Layout under the store root:
//!
//! ```text
//! jobs/<job_id>/events.jsonl     append-only event log
//! jobs/<job_id>/jobspec.json     normalized jobspec snapshot
//! jobs/<job_id>/append.lock      busy lock
//! jobs/<job_id>/cancel.request   cancellation marker
//! jobs/<job_id>/artifacts/       default artifact root
//! ```

use crate::event::{JobEvent, WalEntry};
use crate::lock::{AcquireError, BusyGuard, BusyLocks};
use crate::state::JobState;
use crate::wal::{Wal, WalError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use wrkr_core::canonical::to_canonical_vec;
use wrkr_core::id::is_valid_job_id;
use wrkr_core::{ErrorCode, JobSpec};

pub const EVENTS_FILE: &str = "events.jsonl";
pub const JOBSPEC_FILE: &str = "jobspec.json";
pub const LOCK_FILE: &str = "append.lock";
pub const CANCEL_FILE: &str = "cancel.request";
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Distinguishes concurrent creations within one process
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("job already exists: {0}")]
    JobExists(String),
    #[error("job {0} is busy in another run; retry later")]
    JobBusy(String),
    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),
    #[error("event log for {job_id}: {source}")]
    Wal { job_id: String, source: WalError },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the durable log itself is damaged
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            StoreError::Wal {
                source: WalError::Corrupt { .. },
                ..
            }
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StoreError::JobNotFound(_) => ErrorCode::JobNotFound,
            StoreError::JobBusy(_) => ErrorCode::LeaseConflict,
            StoreError::InvalidJobId(_) | StoreError::JobExists(_) => {
                ErrorCode::InvalidInputSchema
            }
            e if e.is_corrupt() => ErrorCode::StoreCorrupt,
            _ => ErrorCode::GenericFailure,
        }
    }
}

/// Consumer position in a job's log
struct LogCursor {
    offset: u64,
    /// Present while this process holds the job's lease
    writer: Option<Wal>,
}

/// Index entry for one job
struct JobEntry {
    job_id: String,
    dir: PathBuf,
    state: RwLock<Arc<JobState>>,
    log: Mutex<LogCursor>,
}

impl JobEntry {
    fn new(job_id: &str, dir: PathBuf) -> Self {
        Self {
            job_id: job_id.to_string(),
            dir,
            state: RwLock::new(Arc::new(JobState::new(job_id))),
            log: Mutex::new(LogCursor {
                offset: 0,
                writer: None,
            }),
        }
    }

    fn snapshot(&self) -> Arc<JobState> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&state)
    }

    fn wal_error(&self, source: WalError) -> StoreError {
        StoreError::Wal {
            job_id: self.job_id.clone(),
            source,
        }
    }

    /// Apply `entries` to a copy of the current state and publish it
    fn publish(&self, entries: Vec<WalEntry>) -> Result<Arc<JobState>, StoreError> {
        let mut next = (*self.snapshot()).clone();
        for entry in entries {
            let event = entry.event().map_err(|e| {
                self.wal_error(WalError::Corrupt {
                    offset: 0,
                    reason: format!("seq {}: {e}", entry.seq),
                })
            })?;
            next.apply(&entry, event);
        }
        let next = Arc::new(next);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = Arc::clone(&next);
        Ok(next)
    }

    /// Pull events appended by other processes since the last read
    fn refresh(&self) -> Result<Arc<JobState>, StoreError> {
        let mut cursor = self.log.lock().unwrap_or_else(|e| e.into_inner());
        if cursor.writer.is_some() {
            return Ok(self.snapshot());
        }
        let scan = Wal::read_from(&self.dir.join(EVENTS_FILE), cursor.offset)
            .map_err(|e| self.wal_error(e))?;
        if scan.entries.is_empty() {
            return Ok(self.snapshot());
        }
        let state = self.publish(scan.entries)?;
        cursor.offset = scan.end_offset;
        Ok(state)
    }
}

/// Durable job store with an in-memory index of replayed jobs
pub struct JobStore {
    root: PathBuf,
    jobs: RwLock<HashMap<String, Arc<JobEntry>>>,
    locks: BusyLocks,
}

impl JobStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(root.join("jobs"))?;
        Ok(Self {
            root,
            jobs: RwLock::new(HashMap::new()),
            locks: BusyLocks::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join("jobs").join(job_id)
    }

    /// Default artifact root for a job
    pub fn artifacts_dir(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join(ARTIFACTS_DIR)
    }

    fn checked_dir(&self, job_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_job_id(job_id) {
            return Err(StoreError::InvalidJobId(job_id.to_string()));
        }
        Ok(self.job_dir(job_id))
    }

    pub fn exists(&self, job_id: &str) -> bool {
        is_valid_job_id(job_id) && self.job_dir(job_id).join(EVENTS_FILE).is_file()
    }

    /// All job ids in the store, sorted
    pub fn list_jobs(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(self.root.join("jobs"))? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_valid_job_id(&name) && entry.path().join(EVENTS_FILE).is_file() {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn entry(&self, job_id: &str) -> Result<Arc<JobEntry>, StoreError> {
        let dir = self.checked_dir(job_id)?;
        {
            let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = jobs.get(job_id) {
                return Ok(Arc::clone(entry));
            }
        }
        if !dir.join(EVENTS_FILE).is_file() {
            return Err(StoreError::JobNotFound(job_id.to_string()));
        }
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let entry = jobs
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(JobEntry::new(job_id, dir)));
        Ok(Arc::clone(entry))
    }

    /// Current state of a job, including events written by other processes
    pub fn snapshot(&self, job_id: &str) -> Result<Arc<JobState>, StoreError> {
        self.entry(job_id)?.refresh()
    }

    /// All raw log entries of a job, in order
    pub fn events(&self, job_id: &str) -> Result<Vec<WalEntry>, StoreError> {
        let entry = self.entry(job_id)?;
        Wal::replay(&entry.dir.join(EVENTS_FILE)).map_err(|e| entry.wal_error(e))
    }

    /// Create a new job and take its lease.
    pub fn create(
        &self,
        job_id: &str,
        created_at: DateTime<Utc>,
        jobspec: &JobSpec,
        artifact_root: &Path,
    ) -> Result<JobLease, StoreError> {
        self.create_with(job_id, created_at, jobspec, artifact_root, Vec::new())
    }

    /// Create a new job whose log starts with `job_initialized` followed by
    /// `initial`, and take its lease.
    ///
    /// The job directory is assembled under a hidden staging name and renamed
    /// into place, so a failure leaves no trace and the id stays usable.
    pub fn create_with(
        &self,
        job_id: &str,
        created_at: DateTime<Utc>,
        jobspec: &JobSpec,
        artifact_root: &Path,
        initial: Vec<JobEvent>,
    ) -> Result<JobLease, StoreError> {
        let dir = self.checked_dir(job_id)?;
        if dir.exists() {
            return Err(StoreError::JobExists(job_id.to_string()));
        }
        let staging = self
            .root
            .join("jobs")
            .join(format!(
                ".{job_id}.staging-{}-{}",
                std::process::id(),
                STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
            ));
        remove_staging(&staging)?;
        std::fs::create_dir_all(&staging)?;

        let guard = match self.stage(job_id, &staging, &dir, created_at, jobspec, artifact_root, initial) {
            Ok(guard) => guard,
            Err(e) => {
                if let Err(cleanup) = remove_staging(&staging) {
                    tracing::warn!(job_id, error = %cleanup, "failed to remove staged job");
                }
                return Err(e);
            }
        };

        let entry = {
            let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
            let entry = Arc::new(JobEntry::new(job_id, dir));
            jobs.insert(job_id.to_string(), Arc::clone(&entry));
            entry
        };
        let lease = JobLease::attach(entry, guard)?;
        tracing::debug!(job_id, "job created");
        Ok(lease)
    }

    /// Fill `staging` and rename it to `dir`, holding the job's lock throughout
    #[allow(clippy::too_many_arguments)]
    fn stage(
        &self,
        job_id: &str,
        staging: &Path,
        dir: &Path,
        created_at: DateTime<Utc>,
        jobspec: &JobSpec,
        artifact_root: &Path,
        initial: Vec<JobEvent>,
    ) -> Result<BusyGuard, StoreError> {
        write_atomic(&staging.join(JOBSPEC_FILE), &to_canonical_vec(jobspec)?)?;
        // The default root lives inside the job directory itself
        let staged_root = match artifact_root.strip_prefix(dir) {
            Ok(rest) => staging.join(rest),
            Err(_) => artifact_root.to_path_buf(),
        };
        std::fs::create_dir_all(&staged_root)?;

        let guard = self.lock(job_id, staging)?;
        let wal_error = |source| StoreError::Wal {
            job_id: job_id.to_string(),
            source,
        };
        let mut wal = Wal::open(&staging.join(EVENTS_FILE)).map_err(wal_error)?;
        let first = JobEvent::JobInitialized {
            job_id: job_id.to_string(),
            jobspec: jobspec.clone(),
            artifact_root: artifact_root.to_path_buf(),
        };
        for event in std::iter::once(first).chain(initial) {
            wal.append(created_at, &event).map_err(wal_error)?;
        }
        drop(wal);

        if dir.exists() {
            return Err(StoreError::JobExists(job_id.to_string()));
        }
        std::fs::rename(staging, dir).map_err(|e| {
            if dir.exists() {
                StoreError::JobExists(job_id.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(guard)
    }

    /// Take the exclusive execution lease of an existing job
    pub fn acquire(&self, job_id: &str) -> Result<JobLease, StoreError> {
        let entry = self.entry(job_id)?;
        let guard = self.lock(job_id, &entry.dir)?;
        JobLease::attach(entry, guard)
    }

    fn lock(&self, job_id: &str, dir: &Path) -> Result<BusyGuard, StoreError> {
        self.locks
            .try_acquire(job_id, &dir.join(LOCK_FILE))
            .map_err(|e| match e {
                AcquireError::Busy => StoreError::JobBusy(job_id.to_string()),
                AcquireError::Io(e) => StoreError::Io(e),
            })
    }

    /// Delete a job that is not running. The directory is renamed aside
    /// before removal so a partial delete never reads as a job.
    pub fn remove_job(&self, job_id: &str) -> Result<(), StoreError> {
        let entry = self.entry(job_id)?;
        let guard = self.lock(job_id, &entry.dir)?;
        let trash = self.root.join("jobs").join(format!(
            ".{job_id}.removed-{}-{}",
            std::process::id(),
            STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::rename(&entry.dir, &trash)?;
        {
            let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
            jobs.remove(job_id);
        }
        drop(guard);
        remove_staging(&trash)?;
        tracing::debug!(job_id, "job removed");
        Ok(())
    }

    /// Ask a running job to stop at its next admission point
    pub fn request_cancel(&self, job_id: &str) -> Result<(), StoreError> {
        let entry = self.entry(job_id)?;
        write_atomic(&entry.dir.join(CANCEL_FILE), b"cancel\n")?;
        Ok(())
    }

    pub fn cancel_requested(&self, job_id: &str) -> bool {
        self.exists(job_id) && self.job_dir(job_id).join(CANCEL_FILE).is_file()
    }

    /// Write a side file such as `accept_result.json` into the job directory
    pub fn write_job_file(&self, job_id: &str, name: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let entry = self.entry(job_id)?;
        let path = entry.dir.join(name);
        write_atomic(&path, bytes)?;
        Ok(path)
    }

    /// Read a side file; `None` when absent
    pub fn read_job_file(&self, job_id: &str, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entry = self.entry(job_id)?;
        match std::fs::read(entry.dir.join(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exclusive right to append to one job's log. Released on drop.
pub struct JobLease {
    entry: Arc<JobEntry>,
    _guard: BusyGuard,
}

impl JobLease {
    fn attach(entry: Arc<JobEntry>, guard: BusyGuard) -> Result<Self, StoreError> {
        {
            let path = entry.dir.join(EVENTS_FILE);
            let mut cursor = entry.log.lock().unwrap_or_else(|e| e.into_inner());
            let wal = Wal::open(&path).map_err(|e| entry.wal_error(e))?;
            let scan = Wal::read_from(&path, cursor.offset).map_err(|e| entry.wal_error(e))?;
            if !scan.entries.is_empty() {
                entry.publish(scan.entries)?;
            }
            cursor.offset = wal.offset();
            cursor.writer = Some(wal);
        }
        Ok(Self {
            entry,
            _guard: guard,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.entry.job_id
    }

    pub fn job_dir(&self) -> &Path {
        &self.entry.dir
    }

    pub fn state(&self) -> Arc<JobState> {
        self.entry.snapshot()
    }

    /// Durably append an event and return the resulting state
    pub fn append(
        &self,
        created_at: DateTime<Utc>,
        event: JobEvent,
    ) -> Result<Arc<JobState>, StoreError> {
        let mut cursor = self.entry.log.lock().unwrap_or_else(|e| e.into_inner());
        let Some(wal) = cursor.writer.as_mut() else {
            return Err(StoreError::JobBusy(self.entry.job_id.clone()));
        };
        let logged = wal
            .append(created_at, &event)
            .map_err(|e| self.entry.wal_error(e))?;
        let offset = wal.offset();

        let mut next = (*self.entry.snapshot()).clone();
        next.apply(&logged, event);
        let next = Arc::new(next);
        {
            let mut state = self.entry.state.write().unwrap_or_else(|e| e.into_inner());
            *state = Arc::clone(&next);
        }
        cursor.offset = offset;
        Ok(next)
    }

    pub fn cancel_requested(&self) -> bool {
        self.entry.dir.join(CANCEL_FILE).is_file()
    }

    /// Remove a consumed cancellation marker
    pub fn clear_cancel_request(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(self.entry.dir.join(CANCEL_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        let mut cursor = self.entry.log.lock().unwrap_or_else(|e| e.into_inner());
        cursor.writer = None;
    }
}

fn remove_staging(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Write via a temp file and rename so readers never see a torn file
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
