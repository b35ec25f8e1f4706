// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr init` - write a starter jobspec

use crate::context::Context;
use crate::error::CliError;
use crate::output;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use wrkr_core::jobspec::default_jobspec;
use wrkr_core::{Clock, ErrorCode, SystemClock};

pub const DEFAULT_JOBSPEC_PATH: &str = "jobspec.yaml";

#[derive(Args)]
pub struct InitArgs {
    /// Where to write the jobspec
    #[arg(long, default_value = DEFAULT_JOBSPEC_PATH)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct Written<'a> {
    path: &'a Path,
}

pub fn run(ctx: &Context, args: InitArgs) -> Result<()> {
    let spec = default_jobspec(SystemClock.now());
    write_new(&args.path, &serde_yaml::to_string(&spec)?, args.force)?;
    output::emit(ctx.json, &Written { path: &args.path }, || {
        println!("jobspec={}", args.path.display())
    })
}

/// Write `content`, refusing to replace an existing file unless `force`
pub(crate) fn write_new(path: &Path, content: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::new(
            ErrorCode::InvalidInputSchema,
            format!("{} already exists", path.display()),
        )
        .with_suggestion("pass --force to overwrite it")
        .into());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
