// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for engine operations

use crate::jobpack::JobpackError;
use thiserror::Error;
use wrkr_adapters::ProbeError;
use wrkr_core::{CheckpointType, ErrorCode, JobStatus, ValidationError};
use wrkr_storage::StoreError;

/// Errors surfaced to callers of engine operations.
///
/// Step failures never appear here; they end the job and are recorded as checkpoints.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("environment probe: {0}")]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Jobpack(#[from] JobpackError),
    #[error("checkpoint {checkpoint_id} not found for job {job_id}")]
    CheckpointNotFound {
        job_id: String,
        checkpoint_id: String,
    },
    #[error("checkpoint {checkpoint_id} is {kind}, only decision-needed checkpoints can be approved")]
    NotApprovable {
        checkpoint_id: String,
        kind: CheckpointType,
    },
    #[error("job {job_id} has no decision to approve")]
    NothingToApprove { job_id: String },
    #[error("job {job_id} is blocked on {checkpoint_id}; approve it before resuming")]
    ApprovalRequired {
        job_id: String,
        checkpoint_id: String,
    },
    #[error("environment fingerprint changed for job {job_id} (expected {expected}, got {actual})")]
    EnvMismatch {
        job_id: String,
        expected: String,
        actual: String,
    },
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Stable machine code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_)
            | EngineError::NotApprovable { .. }
            | EngineError::NothingToApprove { .. } => ErrorCode::InvalidInputSchema,
            EngineError::Store(e) => e.code(),
            EngineError::Jobpack(e) => e.code(),
            EngineError::CheckpointNotFound { .. } => ErrorCode::JobNotFound,
            EngineError::ApprovalRequired { .. } => ErrorCode::ApprovalRequired,
            EngineError::EnvMismatch { .. } => ErrorCode::EnvFingerprintMismatch,
            EngineError::Probe(_)
            | EngineError::InvalidTransition { .. }
            | EngineError::Io(_)
            | EngineError::Json(_) => ErrorCode::GenericFailure,
        }
    }
}
