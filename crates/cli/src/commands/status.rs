// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr status` and `wrkr checkpoint`

use super::print_status;
use crate::context::Context;
use crate::output::{self, cell};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::sync::Arc;
use wrkr_core::{Checkpoint, Clock, JobStatusView, SystemClock};
use wrkr_storage::StoreError;

#[derive(Args)]
pub struct StatusArgs {
    /// Job to show (default: list every job)
    pub job_id: Option<String>,
}

#[derive(Subcommand)]
pub enum CheckpointCommand {
    /// List a job's checkpoints in order
    List { job_id: String },
    /// Show one checkpoint in full
    Show {
        job_id: String,
        checkpoint_id: String,
    },
}

pub fn status(ctx: &Context, args: StatusArgs) -> Result<()> {
    match args.job_id {
        Some(job_id) => print_status(ctx.json, &ctx.engine()?.status(&job_id)?),
        None => list(ctx),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let now = SystemClock.now();
    let mut views: Vec<JobStatusView> = Vec::new();
    for job_id in store.list_jobs()? {
        match store.snapshot(&job_id) {
            Ok(state) => views.push(state.status_view(now)),
            // removed since listing
            Err(StoreError::JobNotFound(_)) => continue,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "cannot read job");
            }
        }
    }

    output::emit(ctx.json, &views, || {
        if views.is_empty() {
            println!("no jobs");
            return;
        }
        println!(
            "{:<28} {:<10} {:>6} {:>7}  {}",
            "JOB", "STATUS", "CKPTS", "STEPS", "NAME"
        );
        for v in &views {
            println!(
                "{:<28} {:<10} {:>6} {:>7}  {}",
                cell(&v.job_id, 28),
                v.status,
                v.checkpoint_count,
                format!("{}/{}", v.next_step_index, v.step_total),
                cell(&v.name, 40),
            );
        }
    })
}

pub fn checkpoint(ctx: &Context, command: CheckpointCommand) -> Result<()> {
    let engine = ctx.engine()?;
    match command {
        CheckpointCommand::List { job_id } => {
            let checkpoints = engine.checkpoints(&job_id)?;
            output::emit(ctx.json, &checkpoints, || {
                for cp in &checkpoints {
                    println!("{}", checkpoint_line(cp));
                }
            })
        }
        CheckpointCommand::Show {
            job_id,
            checkpoint_id,
        } => {
            let cp = engine.checkpoint(&job_id, &checkpoint_id)?;
            output::emit(ctx.json, &cp, || print_checkpoint(&cp))
        }
    }
}

fn checkpoint_line(cp: &Arc<Checkpoint>) -> String {
    format!(
        "{:<8} {:<16} {:<10} {}",
        cp.checkpoint_id,
        cp.kind.as_str(),
        cp.status,
        cell(&cp.summary, 72)
    )
}

fn print_checkpoint(cp: &Checkpoint) {
    println!(
        "{}",
        output::pairs(&[
            ("checkpoint_id", cp.checkpoint_id.clone()),
            ("type", cp.kind.as_str().to_string()),
            ("status", cp.status.to_string()),
            ("step", cp.step_id.clone().unwrap_or_default()),
            ("created_at", cp.created_at.to_rfc3339()),
        ])
    );
    println!("summary: {}", cp.summary);
    if !cp.reason_codes.is_empty() {
        println!("reasons: {}", cp.reason_codes.join(", "));
    }
    if let Some(action) = &cp.required_action {
        println!("action: {} ({})", action.instructions, action.kind);
    }
    for path in &cp.artifacts_delta.added {
        println!("  + {path}");
    }
    for path in &cp.artifacts_delta.missing {
        println!("  - {path}");
    }
}
