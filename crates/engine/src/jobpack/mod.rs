// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobpack packaging and verification
//!
//! A jobpack is a deterministic zip of a job's normalized jobspec, checkpoint
//! trail, event log and existing artifacts, indexed by a manifest of SHA-256
//! checksums.

mod diff;
mod export;
mod inspect;
mod manifest;
mod verify;

pub use diff::{diff, JobpackDiff};
pub use export::{export, jobpack_path, ExportResult};
pub use inspect::{inspect_archive, inspect_job, Inspection, TimelineEntry, TimelineKind};
pub use manifest::{Manifest, ManifestFile, MANIFEST_FILE, MANIFEST_SCHEMA_ID};
pub use verify::{verify, VerifyReport};

use std::path::PathBuf;
use thiserror::Error;
use wrkr_adapters::ProbeError;
use wrkr_core::ErrorCode;
use wrkr_storage::StoreError;

/// Default output directory for exports
pub const DEFAULT_OUT_DIR: &str = "wrkr-out";

#[derive(Debug, Error)]
pub enum JobpackError {
    /// Integrity failure; the archive is treated as corrupt
    #[error("jobpack verification failed at {entry}: {reason}")]
    ChecksumMismatch { entry: String, reason: String },
    /// An entry that passed its checksum but does not decode as its record type
    #[error("jobpack entry {entry}{} is not a valid record: {reason}", .line.map(|l| format!(" line {l}")).unwrap_or_default())]
    Schema {
        entry: String,
        line: Option<usize>,
        reason: String,
    },
    #[error("jobpack not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("environment probe: {0}")]
    Probe(#[from] ProbeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobpackError {
    pub(crate) fn mismatch(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        JobpackError::ChecksumMismatch {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn schema(
        entry: impl Into<String>,
        line: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        JobpackError::Schema {
            entry: entry.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            JobpackError::ChecksumMismatch { .. } | JobpackError::Zip(_) => {
                ErrorCode::VerifyHashMismatch
            }
            JobpackError::Schema { .. } => ErrorCode::InvalidInputSchema,
            JobpackError::NotFound(_) => ErrorCode::JobNotFound,
            JobpackError::Store(e) => e.code(),
            JobpackError::Probe(_) | JobpackError::Io(_) | JobpackError::Json(_) => {
                ErrorCode::GenericFailure
            }
        }
    }
}

#[cfg(test)]
#[path = "jobpack_tests.rs"]
mod tests;
