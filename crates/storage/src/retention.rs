// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention: age and count based pruning of jobs and exported output
//!
//! Jobs are aged by the newest modification time anywhere in their
//! directory. Files under `<out>/jobpacks` (`*.zip`) and `<out>/reports`
//! are aged individually and may also be capped by count, newest kept.

use crate::store::{JobStore, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct PruneOptions {
    /// Report what would be removed without removing it
    pub dry_run: bool,
    pub job_max_age: Option<Duration>,
    pub jobpack_max_age: Option<Duration>,
    pub report_max_age: Option<Duration>,
    pub max_jobpacks: Option<usize>,
    pub max_reports: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneKind {
    Job,
    Jobpack,
    Report,
}

/// Why an entry matched; `Age` wins over `Count` for the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    Age,
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneEntry {
    pub kind: PruneKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mod_time: DateTime<Utc>,
    pub reason: PruneReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Jobs and files considered
    pub checked: usize,
    pub matched: usize,
    pub removed: usize,
    pub freed_bytes: u64,
    /// Matched entries sorted by path
    pub entries: Vec<PruneEntry>,
}

struct Candidate {
    kind: PruneKind,
    size_bytes: u64,
    mod_time: DateTime<Utc>,
    reason: PruneReason,
    job_id: Option<String>,
}

struct FileInfo {
    path: PathBuf,
    size_bytes: u64,
    mod_time: DateTime<Utc>,
}

/// Remove (or with `dry_run`, list) everything past its retention.
///
/// A job that is running is skipped and stays matched but not removed.
pub fn prune(
    store: &JobStore,
    out_root: &Path,
    now: DateTime<Utc>,
    options: &PruneOptions,
) -> Result<PruneReport, StoreError> {
    let mut report = PruneReport {
        generated_at: now,
        dry_run: options.dry_run,
        checked: 0,
        matched: 0,
        removed: 0,
        freed_bytes: 0,
        entries: Vec::new(),
    };
    let mut candidates = BTreeMap::new();

    let jobs = store.list_jobs()?;
    report.checked += jobs.len();
    if let Some(max_age) = options.job_max_age {
        for job_id in jobs {
            let dir = store.job_dir(&job_id);
            let (mod_time, size_bytes) = latest_mod_and_size(&dir)?;
            if older_than(now, mod_time, max_age) {
                add(
                    &mut candidates,
                    dir,
                    Candidate {
                        kind: PruneKind::Job,
                        size_bytes,
                        mod_time,
                        reason: PruneReason::Age,
                        job_id: Some(job_id),
                    },
                );
            }
        }
    }

    let jobpacks = files_newest_first(&out_root.join("jobpacks"), Some("zip"))?;
    report.checked += jobpacks.len();
    select(
        &mut candidates,
        PruneKind::Jobpack,
        &jobpacks,
        now,
        options.jobpack_max_age,
        options.max_jobpacks,
    );

    let reports = files_newest_first(&out_root.join("reports"), None)?;
    report.checked += reports.len();
    select(
        &mut candidates,
        PruneKind::Report,
        &reports,
        now,
        options.report_max_age,
        options.max_reports,
    );

    report.matched = candidates.len();
    for (path, candidate) in candidates {
        report.entries.push(PruneEntry {
            kind: candidate.kind,
            path: path.clone(),
            size_bytes: candidate.size_bytes,
            mod_time: candidate.mod_time,
            reason: candidate.reason,
        });
        if options.dry_run {
            continue;
        }
        let removed = match &candidate.job_id {
            Some(job_id) => match store.remove_job(job_id) {
                Ok(()) => true,
                Err(StoreError::JobBusy(_)) => {
                    tracing::warn!(job_id = %job_id, "job is running; not pruned");
                    false
                }
                Err(e) => return Err(e),
            },
            None => {
                remove_file(&path)?;
                true
            }
        };
        if removed {
            report.removed += 1;
            report.freed_bytes += candidate.size_bytes;
        }
    }

    tracing::info!(
        dry_run = report.dry_run,
        matched = report.matched,
        removed = report.removed,
        freed_bytes = report.freed_bytes,
        "prune finished"
    );
    Ok(report)
}

fn add(candidates: &mut BTreeMap<PathBuf, Candidate>, path: PathBuf, candidate: Candidate) {
    match candidates.get(&path) {
        Some(existing) if existing.reason <= candidate.reason => {}
        _ => {
            candidates.insert(path, candidate);
        }
    }
}

/// Files past `max_age`, then files beyond the newest `max_count`
fn select(
    candidates: &mut BTreeMap<PathBuf, Candidate>,
    kind: PruneKind,
    files: &[FileInfo],
    now: DateTime<Utc>,
    max_age: Option<Duration>,
    max_count: Option<usize>,
) {
    let candidate = |file: &FileInfo, reason| Candidate {
        kind,
        size_bytes: file.size_bytes,
        mod_time: file.mod_time,
        reason,
        job_id: None,
    };
    if let Some(max_age) = max_age {
        for file in files.iter().filter(|f| older_than(now, f.mod_time, max_age)) {
            add(candidates, file.path.clone(), candidate(file, PruneReason::Age));
        }
    }
    if let Some(max_count) = max_count {
        for file in files.iter().skip(max_count) {
            add(candidates, file.path.clone(), candidate(file, PruneReason::Count));
        }
    }
}

fn older_than(now: DateTime<Utc>, mod_time: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(mod_time)
        .to_std()
        .is_ok_and(|age| age >= max_age)
}

/// Regular files directly under `dir`, newest first; a missing dir is empty
fn files_newest_first(dir: &Path, extension: Option<&str>) -> Result<Vec<FileInfo>, StoreError> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut files = Vec::new();
    for entry in read {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        if let Some(ext) = extension {
            if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                continue;
            }
        }
        files.push(FileInfo {
            path,
            size_bytes: meta.len(),
            mod_time: meta.modified()?.into(),
        });
    }
    files.sort_by(|a, b| b.mod_time.cmp(&a.mod_time).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

/// Newest modification time under `path` and the total size of its files
fn latest_mod_and_size(path: &Path) -> Result<(DateTime<Utc>, u64), StoreError> {
    let meta = std::fs::symlink_metadata(path)?;
    let mut latest: DateTime<Utc> = meta.modified()?.into();
    if !meta.is_dir() {
        return Ok((latest, meta.len()));
    }
    let mut size = 0;
    for entry in std::fs::read_dir(path)? {
        let (mod_time, bytes) = latest_mod_and_size(&entry?.path())?;
        latest = latest.max(mod_time);
        size += bytes;
    }
    Ok((latest, size))
}

fn remove_file(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
