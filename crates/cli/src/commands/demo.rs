// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr demo` - submit, export and verify a sample job

use super::interrupt_token;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use wrkr_core::jobspec::DocumentFormat;
use wrkr_core::{Clock, JobSpec, JobStatus, SystemClock};
use wrkr_engine::jobpack::DEFAULT_OUT_DIR;
use wrkr_engine::SubmitOptions;

const DEMO_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: wrkr_demo
objective: Produce a demo report in three steps
inputs:
  steps:
    - id: outline
      summary: Start the report
      command: mkdir -p reports && echo '# Demo' > reports/demo.md
      artifacts: [reports/demo.md]
    - id: draft
      summary: Add the body
      command: echo 'Produced by wrkr demo.' >> reports/demo.md
    - id: finalize
      summary: Close the report
      command: echo 'Done.' >> reports/demo.md
      artifacts: [reports/demo.md]
expected_artifacts: [reports/demo.md]
adapter:
  name: reference
budgets:
  max_wall_time_seconds: 300
  max_retries: 0
  max_step_count: 10
  max_tool_calls: 10
checkpoint_policy:
  min_interval_seconds: 0
  required_types: [plan, progress, completed]
environment_fingerprint:
  rules: [arch, os]
"#;

#[derive(Args)]
pub struct DemoArgs {
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
}

#[derive(Serialize)]
struct DemoOutput {
    job_id: String,
    status: JobStatus,
    jobpack: PathBuf,
    manifest_sha256: String,
    footer: String,
}

pub(crate) fn demo_jobspec() -> Result<JobSpec> {
    Ok(JobSpec::parse(DEMO_JOBSPEC, DocumentFormat::Yaml)?)
}

pub async fn run(ctx: &Context, args: DemoArgs) -> Result<()> {
    let job_id = format!("job_demo_{}", SystemClock.now().timestamp());
    let engine = ctx.engine()?;
    let state = engine
        .submit(
            demo_jobspec()?,
            SubmitOptions {
                job_id: Some(job_id.clone()),
                workdir: None,
                cancel: interrupt_token(),
            },
        )
        .await?;

    let exported = wrkr_engine::export(
        engine.store(),
        &state.job_id,
        &args.out_dir,
        &ctx.config.engine.producer_version,
    )?;
    wrkr_engine::verify(&exported.path, &ctx.probe()).await?;

    let out = DemoOutput {
        job_id: state.job_id.clone(),
        status: state.status,
        jobpack: exported.path,
        manifest_sha256: exported.manifest_sha256,
        footer: exported.footer,
    };
    output::emit(ctx.json, &out, || {
        println!("job_id={}", out.job_id);
        println!("status={}", out.status);
        println!("jobpack={}", out.jobpack.display());
        println!("footer={}", out.footer);
    })
}
