// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wrkr job engine: step execution, budgets, acceptance and jobpacks

pub mod accept;
mod budget;
mod error;
mod executor;
pub mod jobpack;
mod policy;

pub use accept::{evaluate, AcceptCheck, AcceptFailure, AcceptanceResult};
pub use budget::{Admission, BudgetCheck, BudgetEnforcer, BudgetOverrides};
pub use error::EngineError;
pub use executor::{CancelOutcome, Engine, EngineConfig, EngineDeps, ResumeOptions, SubmitOptions};
pub use jobpack::{
    diff, export, inspect_archive, inspect_job, verify, ExportResult, Inspection, JobpackDiff,
    JobpackError, VerifyReport,
};
pub use policy::CadencePolicy;
