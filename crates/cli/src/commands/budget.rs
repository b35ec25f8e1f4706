// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr budget check`

use crate::context::Context;
use crate::error::CliError;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::json;
use wrkr_core::ErrorCode;
use wrkr_engine::BudgetOverrides;

#[derive(Subcommand)]
pub enum BudgetCommand {
    /// Check a job's recorded usage; an exceeded budget fails a live job
    Check(CheckArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    pub job_id: String,

    /// Ceilings to check against instead of the jobspec's
    #[arg(long)]
    pub max_wall_time_seconds: Option<u64>,

    #[arg(long)]
    pub max_retries: Option<u64>,

    #[arg(long)]
    pub max_step_count: Option<u64>,

    #[arg(long)]
    pub max_tool_calls: Option<u64>,
}

pub fn run(ctx: &Context, command: BudgetCommand) -> Result<()> {
    match command {
        BudgetCommand::Check(args) => check(ctx, args),
    }
}

fn check(ctx: &Context, args: CheckArgs) -> Result<()> {
    let overrides = BudgetOverrides {
        max_wall_time_seconds: args.max_wall_time_seconds,
        max_retries: args.max_retries,
        max_step_count: args.max_step_count,
        max_tool_calls: args.max_tool_calls,
    };
    let check = ctx.engine()?.check_budget(&args.job_id, overrides)?;

    output::emit(ctx.json, &check, || {
        let verdict = if check.exceeded() { "exceeded" } else { "within_limits" };
        println!(
            "{}",
            output::pairs(&[
                ("job_id", check.job_id.clone()),
                ("budget", verdict.to_string()),
                ("checkpoint", check.checkpoint_id.clone().unwrap_or_default()),
                ("violations", check.violations.join(",")),
            ])
        );
    })?;

    if !check.exceeded() {
        return Ok(());
    }
    let mut err = CliError::new(
        ErrorCode::BudgetExceeded,
        format!("budget exceeded for {}: {}", check.job_id, check.violations.join(", ")),
    )
    .with_details(json!({
        "job_id": check.job_id,
        "violations": check.violations,
        "checkpoint_id": check.checkpoint_id,
    }));
    if let Some(id) = &check.checkpoint_id {
        err = err.with_context(format!("the job was stopped; checkpoint {id} records why"));
    }
    Err(err.into())
}
