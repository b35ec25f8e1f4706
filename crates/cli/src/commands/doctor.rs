// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wrkr doctor`: local readiness checks

use crate::context::Context;
use crate::error::CliError;
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use wrkr_core::config::ServeSettings;
use wrkr_core::{Clock, ErrorCode, SystemClock};
use wrkr_engine::jobpack::DEFAULT_OUT_DIR;
use wrkr_serve::ServeError;
use wrkr_storage::{JobStore, StoreError};

#[derive(Args)]
pub struct DoctorArgs {
    /// Output directory that exports and reports are written to
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the run
    Critical,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub ok: bool,
    pub severity: Severity,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl DoctorCheck {
    fn pass(name: &'static str, severity: Severity, details: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            severity,
            details: details.into(),
            remediation: None,
        }
    }

    fn fail(
        name: &'static str,
        severity: Severity,
        details: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            name,
            ok: false,
            severity,
            details: details.into(),
            remediation: Some(remediation.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorResult {
    pub checked_at: DateTime<Utc>,
    /// No critical check failed
    pub ok: bool,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(ctx: &Context, args: DoctorArgs) -> Result<()> {
    let result = diagnose(
        &ctx.store_root,
        &args.out_dir,
        &ctx.config.serve,
        SystemClock.now(),
    );

    output::emit(ctx.json, &result, || {
        for check in &result.checks {
            let mark = match (check.ok, check.severity) {
                (true, _) => "ok",
                (false, Severity::Critical) => "FAIL",
                (false, Severity::Warning) => "warn",
            };
            println!("{mark:<5} {:<14} {}", check.name, check.details);
            if let Some(fix) = &check.remediation {
                println!("      fix: {fix}");
            }
        }
    })?;

    if result.ok {
        return Ok(());
    }
    let failed: Vec<&str> = result
        .checks
        .iter()
        .filter(|c| !c.ok && c.severity == Severity::Critical)
        .map(|c| c.name)
        .collect();
    Err(CliError::new(
        ErrorCode::GenericFailure,
        format!("doctor found problems: {}", failed.join(", ")),
    )
    .with_details(json!({ "failed_checks": failed }))
    .into())
}

pub fn diagnose(
    store_root: &Path,
    out_dir: &Path,
    serve: &ServeSettings,
    now: DateTime<Utc>,
) -> DoctorResult {
    let store = JobStore::open(store_root);
    let mut checks = vec![check_store_root(store_root, store.as_ref().err())];
    checks.push(check_writable("output_layout", out_dir));
    checks.push(check_serve(serve));
    if let Ok(store) = &store {
        checks.push(check_store_jobs(store));
    }

    let ok = checks
        .iter()
        .all(|c| c.ok || c.severity == Severity::Warning);
    tracing::debug!(ok, checks = checks.len(), "doctor finished");
    DoctorResult {
        checked_at: now,
        ok,
        checks,
    }
}

fn check_store_root(root: &Path, open_error: Option<&StoreError>) -> DoctorCheck {
    const NAME: &str = "store_root";
    if let Some(e) = open_error {
        return DoctorCheck::fail(
            NAME,
            Severity::Critical,
            format!("{}: {e}", root.display()),
            "pass --store-root or set WRKR_STORE_ROOT to a writable directory",
        );
    }
    check_writable(NAME, root)
}

fn check_writable(name: &'static str, dir: &Path) -> DoctorCheck {
    match write_test(dir) {
        Ok(()) => DoctorCheck::pass(
            name,
            Severity::Critical,
            format!("{} is writable", dir.display()),
        ),
        Err(e) => DoctorCheck::fail(
            name,
            Severity::Critical,
            format!("{}: {e}", dir.display()),
            format!("make {} a writable directory", dir.display()),
        ),
    }
}

fn write_test(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!(".wrkr-doctor-{}", std::process::id()));
    std::fs::write(&path, b"ok")?;
    std::fs::remove_file(&path)
}

fn check_serve(settings: &ServeSettings) -> DoctorCheck {
    const NAME: &str = "serve_config";
    match wrkr_serve::check_listen(settings) {
        Ok(addr) => DoctorCheck::pass(NAME, Severity::Critical, format!("listen {addr}")),
        Err(e @ ServeError::Unsafe { .. }) => DoctorCheck::fail(
            NAME,
            Severity::Critical,
            e.to_string(),
            "listen on 127.0.0.1, or set allow_non_loopback with an auth_token",
        ),
        Err(e) => DoctorCheck::fail(
            NAME,
            Severity::Critical,
            e.to_string(),
            "set serve.listen to host:port",
        ),
    }
}

fn check_store_jobs(store: &JobStore) -> DoctorCheck {
    const NAME: &str = "store_jobs";
    let jobs = match store.list_jobs() {
        Ok(jobs) => jobs,
        Err(e) => {
            return DoctorCheck::fail(
                NAME,
                Severity::Warning,
                format!("cannot list jobs: {e}"),
                "check the permissions of <store-root>/jobs",
            )
        }
    };
    let unreadable: Vec<String> = jobs
        .iter()
        .filter(|id| match store.snapshot(id) {
            Ok(_) | Err(StoreError::JobNotFound(_)) => false,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "cannot read job");
                true
            }
        })
        .cloned()
        .collect();
    if unreadable.is_empty() {
        DoctorCheck::pass(NAME, Severity::Warning, format!("{} jobs readable", jobs.len()))
    } else {
        DoctorCheck::fail(
            NAME,
            Severity::Warning,
            format!("unreadable jobs: {}", unreadable.join(", ")),
            "export what remains, then remove the damaged job directories",
        )
    }
}
