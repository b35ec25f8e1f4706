// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two command steps producing `reports/result.md`
pub const SIMPLE_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: simple
objective: write a report
inputs:
  steps:
    - id: prepare
      summary: create the reports dir
      command: mkdir -p reports
    - id: write
      summary: write the report
      command: echo done > reports/result.md
      artifacts: [reports/result.md]
expected_artifacts: [reports/result.md]
budgets:
  max_wall_time_seconds: 300
  max_retries: 1
  max_step_count: 10
  max_tool_calls: 10
checkpoint_policy:
  min_interval_seconds: 0
  required_types: [plan, progress, decision-needed, completed]
environment_fingerprint:
  rules: [os]
"#;

/// A command step, a review gate, then a final command step
pub const GATED_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: gated
objective: review before finishing
inputs:
  steps:
    - id: draft
      summary: draft
      command: mkdir -p reports && echo draft > reports/draft.md
      artifacts: [reports/draft.md]
    - id: review
      summary: human review
      decision_needed: true
      required_action: approval
    - id: finish
      summary: finish
      command: echo final > reports/result.md
      artifacts: [reports/result.md]
expected_artifacts: [reports/result.md]
budgets:
  max_wall_time_seconds: 300
  max_retries: 0
  max_step_count: 10
  max_tool_calls: 10
checkpoint_policy:
  min_interval_seconds: 0
  required_types: [plan, progress, decision-needed, completed]
environment_fingerprint:
  rules: [os]
"#;

/// Isolated working directory and job store
pub struct Env {
    pub temp: TempDir,
}

impl Env {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn store(&self) -> PathBuf {
        self.temp.path().join("store")
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.store().join("jobs").join(job_id)
    }

    /// Write `content` under the working directory
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// `wrkr` bound to this store, with inherited `WRKR_*` settings cleared
    pub fn wrkr(&self) -> Command {
        let mut cmd = Command::cargo_bin("wrkr").expect("wrkr binary");
        cmd.current_dir(self.temp.path())
            .env_remove("WRKR_CONFIG")
            .env_remove("WRKR_LOG")
            .env_remove("WRKR_LOG_FILE")
            .env_remove("WRKR_SERVE_AUTH_TOKEN")
            .env_remove("WRKR_ACCEPT_CONFIG")
            .env_remove("WRKR_APPROVED_BY")
            .env("WRKR_STORE_ROOT", self.store());
        cmd
    }

    /// Submit `jobspec` content as `job_id`
    pub fn submit(&self, job_id: &str, jobspec: &str) -> Value {
        let path = self.file(&format!("{job_id}.yaml"), jobspec);
        let out = self
            .wrkr()
            .args(["--json", "submit"])
            .arg(&path)
            .args(["--job-id", job_id])
            .output()
            .expect("run wrkr submit");
        assert!(
            out.status.success(),
            "submit failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        serde_json::from_slice(&out.stdout).expect("status json")
    }

    /// Run with `--json` and parse stdout
    pub fn json(&self, args: &[&str]) -> Value {
        let out = self
            .wrkr()
            .arg("--json")
            .args(args)
            .output()
            .expect("run wrkr");
        assert!(
            out.status.success(),
            "wrkr {args:?} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        serde_json::from_slice(&out.stdout).expect("json stdout")
    }
}

/// Parse the JSON error envelope printed on stderr
pub fn error_envelope(stderr: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stderr);
    let line = text
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("error envelope on stderr");
    serde_json::from_str(line).expect("envelope json")
}
