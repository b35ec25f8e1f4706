// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint records: the append-only audit trail of a job

use crate::job::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointType {
    Plan,
    Progress,
    DecisionNeeded,
    Blocked,
    Completed,
}

impl CheckpointType {
    pub const ALL: [CheckpointType; 5] = [
        CheckpointType::Plan,
        CheckpointType::Progress,
        CheckpointType::DecisionNeeded,
        CheckpointType::Blocked,
        CheckpointType::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointType::Plan => "plan",
            CheckpointType::Progress => "progress",
            CheckpointType::DecisionNeeded => "decision-needed",
            CheckpointType::Blocked => "blocked",
            CheckpointType::Completed => "completed",
        }
    }

    /// Only progress checkpoints may be coalesced by the cadence policy
    pub fn is_rate_limited(self) -> bool {
        self == CheckpointType::Progress
    }
}

impl fmt::Display for CheckpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckpointType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown checkpoint type: {s}"))
    }
}

/// Live counters at the moment a checkpoint was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BudgetState {
    pub wall_time_seconds: u64,
    pub retry_count: u64,
    pub step_count: u64,
    pub tool_call_count: u64,
}

/// Artifact paths observed by a step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactsDelta {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl ArtifactsDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.missing.is_empty()
    }
}

/// What an operator must do before a blocked job may continue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    pub kind: String,
    pub instructions: String,
}

/// Checkpoint content before the log assigns identity and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointDraft {
    #[serde(rename = "type")]
    pub kind: CheckpointType,
    pub summary: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub budget_state: BudgetState,
    #[serde(default)]
    pub artifacts_delta: ArtifactsDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub reason_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl CheckpointDraft {
    pub fn new(
        kind: CheckpointType,
        status: JobStatus,
        summary: impl Into<String>,
        budget_state: BudgetState,
    ) -> Self {
        Self {
            kind,
            summary: summary.into(),
            status,
            step_id: None,
            budget_state,
            artifacts_delta: ArtifactsDelta::default(),
            required_action: None,
            reason_codes: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn step(mut self, step_id: impl Into<String>) -> Self {
        self.step_id = Some(step_id.into());
        self
    }

    pub fn artifacts(mut self, delta: ArtifactsDelta) -> Self {
        self.artifacts_delta = delta;
        self
    }

    pub fn reason(mut self, code: crate::ErrorCode) -> Self {
        let code = code.as_str().to_string();
        if !self.reason_codes.contains(&code) {
            self.reason_codes.push(code);
        }
        self
    }

    pub fn action(mut self, action: RequiredAction) -> Self {
        self.required_action = Some(action);
        self
    }

    pub fn payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// A persisted checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: String,
    pub job_id: String,
    #[serde(rename = "type")]
    pub kind: CheckpointType,
    pub created_at: DateTime<Utc>,
    pub summary: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub budget_state: BudgetState,
    #[serde(default)]
    pub artifacts_delta: ArtifactsDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub reason_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Checkpoint {
    /// Materialize a draft appended at log position `seq`
    pub fn from_draft(job_id: &str, seq: u64, created_at: DateTime<Utc>, draft: CheckpointDraft) -> Self {
        Self {
            checkpoint_id: checkpoint_id(seq),
            job_id: job_id.to_string(),
            kind: draft.kind,
            created_at,
            summary: draft.summary,
            status: draft.status,
            step_id: draft.step_id,
            budget_state: draft.budget_state,
            artifacts_delta: draft.artifacts_delta,
            required_action: draft.required_action,
            reason_codes: draft.reason_codes,
            payload: draft.payload,
        }
    }
}

/// Checkpoint id for the event at log sequence `seq`
pub fn checkpoint_id(seq: u64) -> String {
    format!("cp_{seq}")
}

/// Inverse of [`checkpoint_id`]
pub fn parse_checkpoint_id(id: &str) -> Option<u64> {
    let digits = id.strip_prefix("cp_")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
