// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job events and their log entry encoding
//!
//! A log line is `{seq, created_at, type, payload, crc}`. The CRC32 covers
//! the event type and the canonical payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wrkr_core::canonical::to_canonical_string;
use wrkr_core::{CheckpointDraft, EnvFingerprint, JobSpec, JobStatus};

/// Everything that can happen to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum JobEvent {
    JobInitialized {
        job_id: String,
        jobspec: JobSpec,
        artifact_root: PathBuf,
    },
    StatusChanged {
        from: JobStatus,
        to: JobStatus,
    },
    EnvFingerprintSet {
        fingerprint: EnvFingerprint,
    },
    CheckpointEmitted {
        checkpoint: CheckpointDraft,
    },
    ApprovalRecorded {
        checkpoint_id: String,
        reason: String,
        approved_by: String,
    },
    CountersUpdated {
        retry_count: u64,
        step_count: u64,
        tool_call_count: u64,
    },
    StepAdvanced {
        next_step_index: usize,
    },
    EnvOverrideRecorded {
        expected_hash: String,
        actual_hash: String,
        reason: String,
        approved_by: String,
    },
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: serde_json::Value,
    pub crc: u32,
}

impl WalEntry {
    /// Encode `event` at position `seq`
    pub fn new(
        seq: u64,
        created_at: DateTime<Utc>,
        event: &JobEvent,
    ) -> Result<Self, serde_json::Error> {
        let mut tagged = serde_json::to_value(event)?;
        let kind = tagged
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let payload = tagged
            .get_mut("payload")
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null);
        let crc = Self::calculate_crc(&kind, &payload);
        Ok(Self {
            seq,
            created_at,
            kind,
            payload,
            crc,
        })
    }

    /// Decode the typed event
    pub fn event(&self) -> Result<JobEvent, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": self.kind,
            "payload": self.payload,
        }))
    }

    fn calculate_crc(kind: &str, payload: &serde_json::Value) -> u32 {
        let body = to_canonical_string(payload).unwrap_or_default();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"\n");
        hasher.update(body.as_bytes());
        hasher.finalize()
    }

    /// Verify the checksum matches the content
    pub fn verify(&self) -> bool {
        self.crc == Self::calculate_crc(&self.kind, &self.payload)
    }

    /// Serialize to one canonical JSON line (without the newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        to_canonical_string(self)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
