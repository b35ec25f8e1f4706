// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr export`, `wrkr verify` and `wrkr job inspect|diff`

use crate::context::Context;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use wrkr_engine::jobpack::{jobpack_path, DEFAULT_OUT_DIR};

#[derive(Subcommand)]
pub enum JobCommand {
    /// Show a job's merged event, checkpoint and approval timeline
    Inspect {
        /// Job id, or a path to a jobpack zip
        target: String,
    },
    /// Compare the contents of two jobpacks
    Diff {
        /// Job id or jobpack path
        a: String,
        /// Job id or jobpack path
        b: String,

        /// Where exported jobpacks are looked up by job id
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },
}

#[derive(Args)]
pub struct ExportArgs {
    pub job_id: String,

    /// Output directory; the archive lands in `<out-dir>/jobpacks/`
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Job id, or a path to a jobpack zip
    pub target: String,

    /// Where exported jobpacks are looked up by job id
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
}

pub fn export(ctx: &Context, args: ExportArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let result = wrkr_engine::export(
        &store,
        &args.job_id,
        &args.out_dir,
        &ctx.config.engine.producer_version,
    )?;
    output::emit(ctx.json, &result, || {
        println!("jobpack={}", result.path.display());
        println!("manifest=sha256:{}", result.manifest_sha256);
        println!("{}", result.footer);
    })
}

pub async fn verify(ctx: &Context, args: VerifyArgs) -> Result<()> {
    let path = resolve_target(&args.target, &args.out_dir);
    let report = wrkr_engine::verify(&path, &ctx.probe()).await?;
    output::emit(ctx.json, &report, || {
        println!(
            "{}",
            output::pairs(&[
                ("verified", report.job_id.clone()),
                ("files", report.files_checked.to_string()),
                ("manifest", format!("sha256:{}", report.manifest_sha256)),
                ("reproducible", report.reproducible.to_string()),
            ])
        );
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    })
}

pub fn job(ctx: &Context, command: JobCommand) -> Result<()> {
    match command {
        JobCommand::Inspect { target } => inspect(ctx, &target),
        JobCommand::Diff { a, b, out_dir } => diff(ctx, &a, &b, &out_dir),
    }
}

fn inspect(ctx: &Context, target: &str) -> Result<()> {
    let inspection = if is_archive(target) {
        wrkr_engine::inspect_archive(Path::new(target))?
    } else {
        wrkr_engine::inspect_job(&*ctx.open_store()?, target)?
    };
    output::emit(ctx.json, &inspection, || {
        println!(
            "{}",
            output::pairs(&[
                ("job_id", inspection.job_id.clone()),
                ("status", inspection.status.to_string()),
                ("events", inspection.event_count.to_string()),
                ("checkpoints", inspection.checkpoint_count.to_string()),
                ("approvals", inspection.approval_count.to_string()),
            ])
        );
        for entry in &inspection.timeline {
            println!(
                "{}  {:<10} {:<12} {}",
                entry.at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                entry.kind,
                entry.id,
                entry.summary
            );
        }
    })
}

fn diff(ctx: &Context, a: &str, b: &str, out_dir: &Path) -> Result<()> {
    let result = wrkr_engine::diff(&resolve_target(a, out_dir), &resolve_target(b, out_dir))?;
    output::emit(ctx.json, &result, || {
        println!(
            "{}",
            output::pairs(&[
                ("job_a", result.job_id_a.clone()),
                ("job_b", result.job_id_b.clone()),
                ("added", result.added.len().to_string()),
                ("removed", result.removed.len().to_string()),
                ("changed", result.changed.len().to_string()),
            ])
        );
        for path in &result.added {
            println!("+ {path}");
        }
        for path in &result.removed {
            println!("- {path}");
        }
        for path in &result.changed {
            println!("~ {path}");
        }
    })
}

fn is_archive(target: &str) -> bool {
    Path::new(target).is_file() || target.ends_with(".zip")
}

/// A file or `.zip` path is used as-is; anything else is a job id
pub(crate) fn resolve_target(target: &str, out_dir: &Path) -> PathBuf {
    if is_archive(target) {
        PathBuf::from(target)
    } else {
        jobpack_path(out_dir, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_resolve_under_out_dir() {
        let path = resolve_target("job_a", Path::new("out"));
        assert_eq!(path, Path::new("out/jobpacks/jobpack_job_a.zip"));
    }

    #[test]
    fn zip_paths_are_used_as_is() {
        let path = resolve_target("elsewhere/pack.zip", Path::new("out"));
        assert_eq!(path, Path::new("elsewhere/pack.zip"));
    }
}
