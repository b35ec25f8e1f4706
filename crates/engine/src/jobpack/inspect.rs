// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merged event/checkpoint/approval timeline of one job

use super::manifest::{Manifest, MANIFEST_FILE};
use super::verify::{
    decode, decode_lines, read_entries, JobRecord, APPROVALS_FILE, CHECKPOINTS_FILE, EVENTS_FILE,
    JOB_RECORD_FILE, SIZE_LIMITS,
};
use super::JobpackError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use wrkr_core::checkpoint::parse_checkpoint_id;
use wrkr_core::{ApprovalRecord, Checkpoint, JobStatus};
use wrkr_storage::{JobStore, WalEntry};

/// Entry kinds, in tie-break order for entries sharing a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Approval,
    Checkpoint,
    Event,
}

impl std::fmt::Display for TimelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            TimelineKind::Approval => "approval",
            TimelineKind::Checkpoint => "checkpoint",
            TimelineKind::Event => "event",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub kind: TimelineKind,
    pub id: String,
    pub summary: String,
    /// Position within its kind
    #[serde(skip)]
    ordinal: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub job_id: String,
    pub status: JobStatus,
    pub event_count: usize,
    pub checkpoint_count: usize,
    pub approval_count: usize,
    pub timeline: Vec<TimelineEntry>,
}

/// Timeline of a job read from the store
pub fn inspect_job(store: &JobStore, job_id: &str) -> Result<Inspection, JobpackError> {
    let state = store.snapshot(job_id)?;
    let events: Vec<WalEntry> = store
        .events(job_id)?
        .into_iter()
        .take_while(|entry| entry.seq <= state.last_seq)
        .collect();
    Ok(build(
        job_id,
        state.status,
        &events,
        state.checkpoints.iter().map(|cp| &**cp),
        &state.approvals,
    ))
}

/// Timeline of a job read from an exported jobpack.
///
/// Entries are decoded but checksums are not checked; use `verify` for that.
pub fn inspect_archive(path: &Path) -> Result<Inspection, JobpackError> {
    if !path.is_file() {
        return Err(JobpackError::NotFound(path.to_path_buf()));
    }
    let entries = read_entries(path, SIZE_LIMITS)?;
    let manifest = decode::<Manifest>(&entries, MANIFEST_FILE)?
        .ok_or_else(|| JobpackError::mismatch(MANIFEST_FILE, "missing"))?;
    let record = decode::<JobRecord>(&entries, JOB_RECORD_FILE)?
        .ok_or_else(|| JobpackError::mismatch(JOB_RECORD_FILE, "missing"))?;
    let events = decode_lines::<WalEntry>(&entries, EVENTS_FILE)?;
    let checkpoints = decode_lines::<Checkpoint>(&entries, CHECKPOINTS_FILE)?;
    let approvals = decode_lines::<ApprovalRecord>(&entries, APPROVALS_FILE)?;
    Ok(build(
        &manifest.job_id,
        record.status.status,
        &events,
        checkpoints.iter(),
        &approvals,
    ))
}

fn build<'a>(
    job_id: &str,
    status: JobStatus,
    events: &[WalEntry],
    checkpoints: impl Iterator<Item = &'a Checkpoint>,
    approvals: &[ApprovalRecord],
) -> Inspection {
    let mut timeline: Vec<TimelineEntry> = events
        .iter()
        .map(|e| TimelineEntry {
            at: e.created_at,
            kind: TimelineKind::Event,
            id: format!("evt_{}", e.seq),
            summary: e.kind.clone(),
            ordinal: e.seq,
        })
        .collect();

    let mut checkpoint_count = 0;
    for cp in checkpoints {
        checkpoint_count += 1;
        timeline.push(TimelineEntry {
            at: cp.created_at,
            kind: TimelineKind::Checkpoint,
            id: cp.checkpoint_id.clone(),
            summary: format!("{}:{}", cp.kind, cp.status),
            ordinal: parse_checkpoint_id(&cp.checkpoint_id).unwrap_or(u64::MAX),
        });
    }

    for (n, approval) in (1u64..).zip(approvals) {
        timeline.push(TimelineEntry {
            at: approval.created_at,
            kind: TimelineKind::Approval,
            id: format!("approval_{n}"),
            summary: approval.checkpoint_id.clone(),
            ordinal: n,
        });
    }

    timeline.sort_by(|a, b| {
        (a.at, a.kind, a.ordinal, &a.id).cmp(&(b.at, b.kind, b.ordinal, &b.id))
    });

    Inspection {
        job_id: job_id.to_string(),
        status,
        event_count: events.len(),
        checkpoint_count,
        approval_count: approvals.len(),
        timeline,
    }
}
