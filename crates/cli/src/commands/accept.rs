// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr accept run` and `wrkr accept init`

use super::init::write_new;
use crate::context::Context;
use crate::error::CliError;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use wrkr_core::accept::DEFAULT_ACCEPT_CONFIG_PATH;
use wrkr_core::{AcceptConfig, ErrorCode, PathRules};
use wrkr_engine::accept::{ACCEPT_RESULT_FILE, JUNIT_FILE};
use wrkr_engine::AcceptanceResult;

#[derive(Subcommand)]
pub enum AcceptCommand {
    /// Evaluate a job's artifacts against the acceptance config
    Run(RunArgs),
    /// Write a starter acceptance config
    Init(InitArgs),
}

#[derive(Args)]
pub struct RunArgs {
    pub job_id: String,

    /// Acceptance config (default: accept.config_path from config, else accept.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CI mode: also write a JUnit report
    #[arg(long)]
    pub ci: bool,

    /// JUnit report path (default: <job-dir>/accept.junit.xml)
    #[arg(long)]
    pub junit: Option<PathBuf>,
}

#[derive(Args)]
pub struct InitArgs {
    #[arg(long, default_value = DEFAULT_ACCEPT_CONFIG_PATH)]
    pub path: PathBuf,

    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    #[serde(flatten)]
    result: &'a AcceptanceResult,
    result_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    junit_path: Option<PathBuf>,
}

pub async fn run(ctx: &Context, command: AcceptCommand) -> Result<()> {
    match command {
        AcceptCommand::Run(args) => accept_run(ctx, args).await,
        AcceptCommand::Init(args) => accept_init(ctx, args),
    }
}

async fn accept_run(ctx: &Context, args: RunArgs) -> Result<()> {
    let config = load_config(ctx, args.config.as_deref())?;
    let store = ctx.open_store()?;
    let state = store.snapshot(&args.job_id)?;

    let result = wrkr_engine::evaluate(&ctx.runner(), &state, &config).await;
    let result_path = store.write_job_file(
        &args.job_id,
        ACCEPT_RESULT_FILE,
        &serde_json::to_vec_pretty(&result)?,
    )?;
    let junit_path = match (args.junit, args.ci) {
        (Some(path), _) => Some(write_junit(&path, &result)?),
        (None, true) => Some(store.write_job_file(
            &args.job_id,
            JUNIT_FILE,
            result.to_junit().as_bytes(),
        )?),
        (None, false) => None,
    };
    tracing::info!(job_id = %args.job_id, passed = result.passed, checks = result.checks_run, "acceptance evaluated");

    let out = RunOutput {
        result: &result,
        result_path,
        junit_path,
    };
    output::emit(ctx.json, &out, || {
        println!(
            "{}",
            output::pairs(&[
                ("job_id", result.job_id.clone()),
                ("passed", result.passed.to_string()),
                (
                    "checks",
                    format!("{}/{}", result.checks_passed, result.checks_run)
                ),
            ])
        );
        for failure in &result.failures {
            println!("  {} {}: {}", failure.reason_code, failure.check.as_str(), failure.message);
        }
    })?;

    if result.passed {
        return Ok(());
    }
    let code = result
        .reason_codes
        .first()
        .copied()
        .unwrap_or(ErrorCode::AcceptTestFail);
    Err(CliError::new(
        code,
        format!("acceptance failed for {}", result.job_id),
    )
    .with_details(json!({
        "job_id": result.job_id,
        "reason_codes": result.reason_codes,
        "failures": result.failures,
    }))
    .into())
}

/// `--config` and `accept.config_path` must exist; the default may be absent
fn load_config(ctx: &Context, flag: Option<&Path>) -> Result<AcceptConfig> {
    let configured = ctx
        .config
        .accept
        .config_path
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty());
    let config = match (flag, configured) {
        (Some(path), _) | (None, Some(path)) => AcceptConfig::load(path, true)?,
        (None, None) => AcceptConfig::load(Path::new(DEFAULT_ACCEPT_CONFIG_PATH), false)?,
    };
    Ok(config)
}

fn write_junit(path: &Path, result: &AcceptanceResult) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, result.to_junit())?;
    Ok(path.to_path_buf())
}

/// Config written by `accept init`
pub(crate) fn starter_config() -> AcceptConfig {
    AcceptConfig {
        required_artifacts: vec!["reports/result.md".to_string()],
        path_rules: PathRules {
            max_artifact_paths: 100,
            forbidden_prefixes: vec![".git/".to_string()],
            allowed_prefixes: Vec::new(),
        },
        ..AcceptConfig::default()
    }
}

fn accept_init(ctx: &Context, args: InitArgs) -> Result<()> {
    write_new(&args.path, &serde_yaml::to_string(&starter_config())?, args.force)?;
    output::emit(ctx.json, &json!({ "path": args.path }), || {
        println!("accept_config={}", args.path.display())
    })
}
