// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized job state from event replay

use crate::event::{JobEvent, WalEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use wrkr_core::checkpoint::parse_checkpoint_id;
use wrkr_core::job::STATUS_SCHEMA_ID;
use wrkr_core::{
    ApprovalRecord, BudgetState, Checkpoint, CheckpointType, EnvFingerprint, JobSpec, JobStatus,
    JobStatusView,
};

/// Counters shared across the whole job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counters {
    pub retry_count: u64,
    pub step_count: u64,
    pub tool_call_count: u64,
}

/// State of one job, built by applying its events in order
#[derive(Debug, Clone)]
pub struct JobState {
    pub job_id: String,
    pub status: JobStatus,
    pub jobspec: Arc<JobSpec>,
    pub artifact_root: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub fingerprint: Option<EnvFingerprint>,
    pub checkpoints: Vec<Arc<Checkpoint>>,
    pub approvals: Vec<ApprovalRecord>,
    pub counters: Counters,
    pub next_step_index: usize,
    pub env_overrides: usize,
    /// Sequence of the last applied event
    pub last_seq: u64,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            jobspec: Arc::new(JobSpec::default()),
            artifact_root: PathBuf::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            fingerprint: None,
            checkpoints: Vec::new(),
            approvals: Vec::new(),
            counters: Counters::default(),
            next_step_index: 0,
            env_overrides: 0,
            last_seq: 0,
        }
    }

    /// Apply one logged event
    pub fn apply(&mut self, entry: &WalEntry, event: JobEvent) {
        self.last_seq = entry.seq;
        self.updated_at = entry.created_at;

        match event {
            JobEvent::JobInitialized {
                job_id,
                jobspec,
                artifact_root,
            } => {
                self.job_id = job_id;
                self.jobspec = Arc::new(jobspec);
                self.artifact_root = artifact_root;
                self.created_at = entry.created_at;
                self.status = JobStatus::Pending;
            }

            JobEvent::StatusChanged { to, .. } => {
                self.status = to;
            }

            JobEvent::EnvFingerprintSet { fingerprint } => {
                self.fingerprint = Some(fingerprint);
            }

            JobEvent::CheckpointEmitted { checkpoint } => {
                let checkpoint =
                    Checkpoint::from_draft(&self.job_id, entry.seq, entry.created_at, checkpoint);
                self.checkpoints.push(Arc::new(checkpoint));
            }

            JobEvent::ApprovalRecorded {
                checkpoint_id,
                reason,
                approved_by,
            } => {
                self.approvals.push(ApprovalRecord {
                    checkpoint_id,
                    job_id: self.job_id.clone(),
                    reason,
                    approved_by,
                    created_at: entry.created_at,
                });
            }

            JobEvent::CountersUpdated {
                retry_count,
                step_count,
                tool_call_count,
            } => {
                self.counters = Counters {
                    retry_count,
                    step_count,
                    tool_call_count,
                };
            }

            JobEvent::StepAdvanced { next_step_index } => {
                self.next_step_index = next_step_index;
            }

            JobEvent::EnvOverrideRecorded { .. } => {
                self.env_overrides += 1;
            }
        }
    }

    /// Get a checkpoint by id
    pub fn checkpoint(&self, checkpoint_id: &str) -> Option<&Arc<Checkpoint>> {
        let seq = parse_checkpoint_id(checkpoint_id)?;
        // Ids are event sequences, so the list is sorted by seq
        self.checkpoints
            .binary_search_by_key(&seq, |cp| {
                parse_checkpoint_id(&cp.checkpoint_id).unwrap_or_default()
            })
            .ok()
            .map(|i| &self.checkpoints[i])
    }

    pub fn last_checkpoint(&self) -> Option<&Arc<Checkpoint>> {
        self.checkpoints.last()
    }

    /// The most recent decision-needed checkpoint
    pub fn latest_decision(&self) -> Option<&Arc<Checkpoint>> {
        self.checkpoints
            .iter()
            .rev()
            .find(|cp| cp.kind == CheckpointType::DecisionNeeded)
    }

    /// The most recent decision-needed checkpoint raised by `step_id`
    pub fn decision_for_step(&self, step_id: &str) -> Option<&Arc<Checkpoint>> {
        self.checkpoints.iter().rev().find(|cp| {
            cp.kind == CheckpointType::DecisionNeeded && cp.step_id.as_deref() == Some(step_id)
        })
    }

    pub fn approval_for(&self, checkpoint_id: &str) -> Option<&ApprovalRecord> {
        self.approvals
            .iter()
            .find(|a| a.checkpoint_id == checkpoint_id)
    }

    /// Creation time of the most recent progress checkpoint
    pub fn last_progress_at(&self) -> Option<DateTime<Utc>> {
        self.checkpoints
            .iter()
            .rev()
            .find(|cp| cp.kind == CheckpointType::Progress)
            .map(|cp| cp.created_at)
    }

    /// Union of all artifacts reported as added, sorted
    pub fn artifacts_added(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .checkpoints
            .iter()
            .flat_map(|cp| cp.artifacts_delta.added.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Seconds since creation; terminal jobs stop the clock at their last event
    pub fn wall_time_seconds(&self, now: DateTime<Utc>) -> u64 {
        let end = if self.status.is_terminal() {
            self.updated_at
        } else {
            now
        };
        (end - self.created_at).num_seconds().max(0) as u64
    }

    pub fn budget_state(&self, now: DateTime<Utc>) -> BudgetState {
        BudgetState {
            wall_time_seconds: self.wall_time_seconds(now),
            retry_count: self.counters.retry_count,
            step_count: self.counters.step_count,
            tool_call_count: self.counters.tool_call_count,
        }
    }

    pub fn status_view(&self, now: DateTime<Utc>) -> JobStatusView {
        let last = self.last_checkpoint();
        JobStatusView {
            schema_id: STATUS_SCHEMA_ID.to_string(),
            schema_version: wrkr_core::SCHEMA_VERSION.to_string(),
            job_id: self.job_id.clone(),
            name: self.jobspec.name.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            checkpoint_count: self.checkpoints.len(),
            last_checkpoint_id: last.map(|cp| cp.checkpoint_id.clone()),
            next_step_index: self.next_step_index,
            step_total: self.jobspec.inputs.steps.len(),
            budget_state: self.budget_state(now),
            reason_codes: last.map(|cp| cp.reason_codes.clone()).unwrap_or_default(),
            environment_hash: self.fingerprint.as_ref().map(|fp| fp.hash.clone()),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
