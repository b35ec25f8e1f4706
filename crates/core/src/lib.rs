// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wrkr-core: data model for the wrkr job engine
//!
//! This crate provides:
//! - JobSpec parsing, validation and normalization
//! - Environment fingerprint rules and digests
//! - Checkpoint, job status and approval records
//! - Acceptance policy documents
//! - Stable error codes, clock and id abstractions, canonical JSON
//! - Layered project configuration

pub mod accept;
pub mod canonical;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod envfp;
pub mod error;
pub mod id;
pub mod job;
pub mod jobspec;

pub use accept::{AcceptConfig, PathRules};
pub use checkpoint::{
    ArtifactsDelta, BudgetState, Checkpoint, CheckpointDraft, CheckpointType, RequiredAction,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, EngineSettings, ProgressCoalescing, WrkrConfig};
pub use envfp::{EnvFingerprint, Rule};
pub use error::{ErrorBody, ErrorCode, ErrorEnvelope};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{ApprovalRecord, JobStatus, JobStatusView};
pub use jobspec::{Budgets, JobSpec, Step, ValidationError};

/// Version string stamped into produced documents
pub const PRODUCER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version shared by every wrkr document
pub const SCHEMA_VERSION: &str = "v1";
