// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr store prune`

use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use wrkr_core::{Clock, SystemClock};
use wrkr_engine::jobpack::DEFAULT_OUT_DIR;
use wrkr_storage::PruneOptions;

#[derive(Subcommand)]
pub enum StoreCommand {
    /// Remove old jobs, jobpacks and reports
    Prune(PruneArgs),
}

#[derive(Args)]
pub struct PruneArgs {
    /// List what would be removed without removing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output directory holding `jobpacks/` and `reports/`
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Remove jobs untouched for this long (e.g. 30d, 72h)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub job_max_age: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub jobpack_max_age: Option<Duration>,

    #[arg(long, value_parser = humantime::parse_duration)]
    pub report_max_age: Option<Duration>,

    /// Keep at most this many jobpacks, newest first
    #[arg(long)]
    pub max_jobpacks: Option<usize>,

    /// Keep at most this many reports, newest first
    #[arg(long)]
    pub max_reports: Option<usize>,
}

pub fn run(ctx: &Context, command: StoreCommand) -> Result<()> {
    match command {
        StoreCommand::Prune(args) => prune(ctx, args),
    }
}

fn prune(ctx: &Context, args: PruneArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let options = PruneOptions {
        dry_run: args.dry_run,
        job_max_age: args.job_max_age,
        jobpack_max_age: args.jobpack_max_age,
        report_max_age: args.report_max_age,
        max_jobpacks: args.max_jobpacks,
        max_reports: args.max_reports,
    };
    let report = wrkr_storage::prune(&store, &args.out_dir, SystemClock.now(), &options)?;

    output::emit(ctx.json, &report, || {
        println!(
            "{}",
            output::pairs(&[
                ("dry_run", report.dry_run.to_string()),
                ("checked", report.checked.to_string()),
                ("matched", report.matched.to_string()),
                ("removed", report.removed.to_string()),
                ("freed_bytes", report.freed_bytes.to_string()),
            ])
        );
        for entry in &report.entries {
            println!(
                "  {:<8} {:<6} {}",
                format!("{:?}", entry.kind).to_lowercase(),
                format!("{:?}", entry.reason).to_lowercase(),
                entry.path.display()
            );
        }
    })
}
