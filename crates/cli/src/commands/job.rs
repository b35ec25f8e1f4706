// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr submit`, `approve`, `resolve`, `resume` and `cancel`

use super::{interrupt_token, print_status};
use crate::context::{approver, Context};
use crate::error::CliError;
use crate::output;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use wrkr_core::{Clock, ErrorCode, JobSpec, SystemClock};
use wrkr_engine::{CancelOutcome, ResumeOptions, SubmitOptions};

#[derive(Args)]
pub struct SubmitArgs {
    /// Jobspec file (YAML or JSON)
    pub jobspec: PathBuf,

    /// Use this job id instead of a generated one
    #[arg(long)]
    pub job_id: Option<String>,

    /// Directory steps run in and artifacts are read from
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ApproveArgs {
    pub job_id: String,

    /// Checkpoint to approve (default: the latest decision checkpoint)
    #[arg(long)]
    pub checkpoint: Option<String>,

    /// Why the decision was approved
    #[arg(long)]
    pub reason: String,

    /// Approver identity (default: $WRKR_APPROVED_BY or $USER)
    #[arg(long)]
    pub approved_by: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub job_id: String,

    /// Decision checkpoint to approve before resuming
    pub checkpoint_id: String,

    /// Why the decision was approved
    #[arg(long)]
    pub reason: String,

    #[arg(long)]
    pub approved_by: Option<String>,
}

#[derive(Args)]
pub struct ResumeArgs {
    pub job_id: String,

    /// Continue even though the environment fingerprint changed
    #[arg(long)]
    pub override_env_mismatch: bool,

    /// Reason recorded with the override
    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub approved_by: Option<String>,
}

#[derive(Args)]
pub struct CancelArgs {
    pub job_id: String,

    #[arg(long, default_value = "")]
    pub reason: String,
}

pub async fn submit(ctx: &Context, args: SubmitArgs) -> Result<()> {
    let spec = JobSpec::load(&args.jobspec)?;
    let engine = ctx.engine()?;
    let state = engine
        .submit(
            spec,
            SubmitOptions {
                job_id: args.job_id,
                workdir: args.workdir,
                cancel: interrupt_token(),
            },
        )
        .await?;
    print_status(ctx.json, &state.status_view(SystemClock.now()))
}

pub async fn approve(ctx: &Context, args: ApproveArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let approved_by = approver(args.approved_by.as_deref(), |k| std::env::var(k).ok());
    let record = engine
        .approve(
            &args.job_id,
            args.checkpoint.as_deref(),
            &args.reason,
            &approved_by,
        )
        .await?;
    output::emit(ctx.json, &record, || {
        println!(
            "{}",
            output::pairs(&[
                ("job_id", record.job_id.clone()),
                ("approved", record.checkpoint_id.clone()),
                ("by", record.approved_by.clone()),
            ])
        )
    })
}

pub async fn resolve(ctx: &Context, args: ResolveArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let state = engine
        .resolve(
            &args.job_id,
            &args.checkpoint_id,
            &args.reason,
            ResumeOptions {
                approved_by: approver(args.approved_by.as_deref(), |k| std::env::var(k).ok()),
                cancel: interrupt_token(),
                ..ResumeOptions::default()
            },
        )
        .await?;
    print_status(ctx.json, &state.status_view(SystemClock.now()))
}

pub async fn resume(ctx: &Context, args: ResumeArgs) -> Result<()> {
    let override_env_mismatch = match (args.override_env_mismatch, args.reason) {
        (false, _) => None,
        (true, Some(reason)) if !reason.trim().is_empty() => Some(reason),
        (true, _) => {
            return Err(CliError::new(
                ErrorCode::InvalidInputSchema,
                "--override-env-mismatch requires --reason",
            )
            .with_details(serde_json::json!({ "field": "reason" }))
            .into())
        }
    };
    let engine = ctx.engine()?;
    let state = engine
        .resume(
            &args.job_id,
            ResumeOptions {
                override_env_mismatch,
                approved_by: approver(args.approved_by.as_deref(), |k| std::env::var(k).ok()),
                cancel: interrupt_token(),
            },
        )
        .await?;
    print_status(ctx.json, &state.status_view(SystemClock.now()))
}

#[derive(Serialize)]
struct CancelRequested<'a> {
    job_id: &'a str,
    cancel_requested: bool,
}

pub async fn cancel(ctx: &Context, args: CancelArgs) -> Result<()> {
    let engine = ctx.engine()?;
    match engine.cancel(&args.job_id, &args.reason).await? {
        CancelOutcome::Cancelled(state) => {
            print_status(ctx.json, &state.status_view(SystemClock.now()))
        }
        CancelOutcome::Requested => {
            let value = CancelRequested {
                job_id: &args.job_id,
                cancel_requested: true,
            };
            output::emit(ctx.json, &value, || {
                println!("job_id={} cancel_requested=true", args.job_id)
            })
        }
    }
}
