// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wrkr - durable job lifecycle and checkpoint engine

mod commands;
mod context;
mod error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{accept, budget, demo, doctor, init, job, jobpack, serve, status, store};
use context::{Context, GlobalArgs};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "wrkr",
    version,
    about = "wrkr - durable jobs with checkpoints, approvals and verifiable jobpacks"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter jobspec
    Init(init::InitArgs),
    /// Validate a jobspec, create the job and run it
    Submit(job::SubmitArgs),
    /// Show one job, or list every job
    Status(status::StatusArgs),
    /// Inspect a job's checkpoints
    #[command(subcommand)]
    Checkpoint(status::CheckpointCommand),
    /// Approve a decision checkpoint
    Approve(job::ApproveArgs),
    /// Approve a named gate and continue; a resolved gate is left alone
    Resolve(job::ResolveArgs),
    /// Continue a blocked or interrupted job
    Resume(job::ResumeArgs),
    /// Stop a job
    Cancel(job::CancelArgs),
    /// Package a job into a jobpack zip
    Export(jobpack::ExportArgs),
    /// Check a jobpack's integrity
    Verify(jobpack::VerifyArgs),
    /// Inspect or compare jobs and jobpacks
    #[command(subcommand)]
    Job(jobpack::JobCommand),
    /// Check a job's usage against its budget
    #[command(subcommand)]
    Budget(budget::BudgetCommand),
    /// Store maintenance
    #[command(subcommand)]
    Store(store::StoreCommand),
    /// Acceptance checks
    #[command(subcommand)]
    Accept(accept::AcceptCommand),
    /// Serve the read-only status API
    Serve(serve::ServeArgs),
    /// Run a sample job end to end
    Demo(demo::DemoArgs),
    /// Check the store, output directory and serve settings
    Doctor(doctor::DoctorArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.global.json;

    let level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    let _guard = match logging::init(cli.global.log_file.as_deref(), level) {
        Ok(guard) => guard,
        Err(e) => {
            error::classify(&e).report(json);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let err = error::classify(&e);
            tracing::debug!(code = %err.code, "command failed");
            err.report(json);
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(&cli.global)?;
    match cli.command {
        Commands::Init(args) => init::run(&ctx, args),
        Commands::Submit(args) => job::submit(&ctx, args).await,
        Commands::Status(args) => status::status(&ctx, args),
        Commands::Checkpoint(command) => status::checkpoint(&ctx, command),
        Commands::Approve(args) => job::approve(&ctx, args).await,
        Commands::Resolve(args) => job::resolve(&ctx, args).await,
        Commands::Resume(args) => job::resume(&ctx, args).await,
        Commands::Cancel(args) => job::cancel(&ctx, args).await,
        Commands::Export(args) => jobpack::export(&ctx, args),
        Commands::Verify(args) => jobpack::verify(&ctx, args).await,
        Commands::Job(command) => jobpack::job(&ctx, command),
        Commands::Budget(command) => budget::run(&ctx, command),
        Commands::Store(command) => store::run(&ctx, command),
        Commands::Accept(command) => accept::run(&ctx, command).await,
        Commands::Serve(args) => serve::run(&ctx, args),
        Commands::Demo(args) => demo::run(&ctx, args).await,
        Commands::Doctor(args) => doctor::run(&ctx, args),
    }
}
