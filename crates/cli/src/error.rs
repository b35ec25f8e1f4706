// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing error display.
//!
//! Every failure is classified into a stable [`ErrorCode`], shown either as
//! text (message, context, suggestions) or as the JSON error envelope, and
//! mapped to the process exit code.

use serde_json::{json, Value};
use std::fmt;
use wrkr_core::config::ConfigError;
use wrkr_core::{ErrorCode, ErrorEnvelope, ValidationError};
use wrkr_engine::{EngineError, JobpackError};
use wrkr_serve::ServeError;
use wrkr_storage::StoreError;

/// Error with a machine code, context and recovery suggestions
#[derive(Debug, Clone)]
pub struct CliError {
    pub code: ErrorCode,
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub details: Value,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            details: json!({}),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.code, &self.message).with_details(self.details.clone())
    }

    /// Write to stderr in the selected format
    pub fn report(&self, json: bool) {
        if json {
            match serde_json::to_string(&self.envelope()) {
                Ok(line) => eprintln!("{line}"),
                Err(_) => eprintln!("{self}"),
            }
        } else {
            eprint!("{self}");
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {} ({})", self.message, self.code)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}

/// Map any command failure onto a [`CliError`]
pub fn classify(err: &anyhow::Error) -> CliError {
    let message = format!("{err:#}");
    if let Some(e) = err.downcast_ref::<CliError>() {
        return e.clone();
    }
    if let Some(e) = err.downcast_ref::<EngineError>() {
        return engine_error(e, message);
    }
    if let Some(e) = err.downcast_ref::<JobpackError>() {
        return jobpack_error(e, message);
    }
    if let Some(e) = err.downcast_ref::<StoreError>() {
        return store_error(e, message);
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        return CliError::new(ErrorCode::InvalidInputSchema, message)
            .with_details(json!({ "field": e.field }));
    }
    if let Some(e) = err.downcast_ref::<ServeError>() {
        let error = CliError::new(e.code(), message);
        return match e {
            ServeError::Unsafe { .. } => error.with_suggestion(
                "bind to 127.0.0.1, or pass --allow-non-loopback together with --auth-token",
            ),
            _ => error,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CliError::new(ErrorCode::InvalidInputSchema, message);
    }
    CliError::new(ErrorCode::GenericFailure, message)
}

fn engine_error(err: &EngineError, message: String) -> CliError {
    match err {
        EngineError::Store(e) => store_error(e, message),
        EngineError::Jobpack(e) => jobpack_error(e, message),
        EngineError::Validation(e) => CliError::new(err.code(), message)
            .with_details(json!({ "field": e.field })),
        EngineError::ApprovalRequired {
            job_id,
            checkpoint_id,
        } => CliError::new(err.code(), message)
            .with_context(format!("checkpoint {checkpoint_id} is waiting for a decision"))
            .with_suggestion(format!(
                "approve it: wrkr approve {job_id} --checkpoint {checkpoint_id} --reason <text>"
            ))
            .with_details(json!({ "job_id": job_id, "checkpoint_id": checkpoint_id })),
        EngineError::EnvMismatch {
            job_id,
            expected,
            actual,
        } => CliError::new(err.code(), message)
            .with_context("the environment fingerprint changed since the job was submitted")
            .with_suggestion(format!(
                "resume anyway: wrkr resume {job_id} --override-env-mismatch --reason <text>"
            ))
            .with_details(json!({ "job_id": job_id, "expected": expected, "actual": actual })),
        _ => CliError::new(err.code(), message),
    }
}

fn jobpack_error(err: &JobpackError, message: String) -> CliError {
    match err {
        JobpackError::Store(e) => store_error(e, message),
        JobpackError::ChecksumMismatch { entry, reason } => CliError::new(err.code(), message)
            .with_context("the archive was modified or damaged after export")
            .with_details(json!({ "entry": entry, "reason": reason })),
        JobpackError::NotFound(path) => CliError::new(err.code(), message)
            .with_suggestion("export it first: wrkr export <job-id>")
            .with_details(json!({ "path": path })),
        _ => CliError::new(err.code(), message),
    }
}

fn store_error(err: &StoreError, message: String) -> CliError {
    match err {
        StoreError::JobNotFound(job_id) => CliError::new(err.code(), message)
            .with_suggestion("list known jobs: wrkr status")
            .with_details(json!({ "job_id": job_id })),
        StoreError::JobBusy(job_id) => CliError::new(err.code(), message)
            .with_context("another process is executing this job")
            .with_suggestion(format!("check progress: wrkr status {job_id}"))
            .with_details(json!({ "job_id": job_id })),
        e if e.is_corrupt() => CliError::new(err.code(), message)
            .with_context("the job's event log failed its integrity check"),
        _ => CliError::new(err.code(), message),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
