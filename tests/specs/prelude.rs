//! Shared helpers for behavioral specs.
//!
//! Each `Project` is an isolated working directory with its own job store;
//! `wrkr()` runs the built binary against it.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use serde_json::Value;

/// Two command steps, the second producing `reports/result.md`
pub const LINEAR_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: linear
objective: two steps
inputs:
  steps:
    - id: prepare
      command: mkdir -p reports
    - id: write
      command: echo ok > reports/result.md
      artifacts: [reports/result.md]
expected_artifacts: [reports/result.md]
budgets:
  max_wall_time_seconds: 300
  max_retries: 0
  max_step_count: 10
  max_tool_calls: 10
environment_fingerprint:
  rules: [os]
"#;

/// A failing command with one retry
pub const FAILING_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: failing
inputs:
  steps:
    - id: broken
      command: exit 3
budgets:
  max_wall_time_seconds: 300
  max_retries: 1
  max_step_count: 10
  max_tool_calls: 10
"#;

/// Three steps but a step budget of two
pub const OVER_BUDGET_JOBSPEC: &str = r#"
schema_id: wrkr.jobspec
schema_version: v1
name: over_budget
inputs:
  steps:
    - id: one
      command: "true"
    - id: two
      command: "true"
    - id: three
      command: "true"
budgets:
  max_wall_time_seconds: 300
  max_retries: 0
  max_step_count: 2
  max_tool_calls: 10
"#;

pub struct Project {
    temp: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn store(&self) -> PathBuf {
        self.temp.path().join("store")
    }

    pub fn file(&self, name: &str, content: &str) {
        let path = self.temp.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn wrkr(&self) -> CliRun {
        let mut cmd = Command::cargo_bin("wrkr").unwrap();
        cmd.current_dir(self.temp.path())
            .env_remove("WRKR_CONFIG")
            .env_remove("WRKR_LOG")
            .env_remove("WRKR_LOG_FILE")
            .env_remove("WRKR_SERVE_AUTH_TOKEN")
            .env_remove("WRKR_ACCEPT_CONFIG")
            .env("WRKR_STORE_ROOT", self.store());
        CliRun { cmd }
    }
}

pub struct CliRun {
    cmd: Command,
}

impl CliRun {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn run(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        RunAssert {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run and require exit 0
    pub fn passes(self) -> RunAssert {
        let run = self.run();
        assert_eq!(
            run.code,
            Some(0),
            "expected success\nstdout: {}\nstderr: {}",
            run.stdout,
            run.stderr
        );
        run
    }

    /// Run and require the given exit code
    pub fn exits(self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(
            run.code,
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            run.stdout,
            run.stderr
        );
        run
    }
}

pub struct RunAssert {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl RunAssert {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap()
    }

    /// The JSON error envelope printed on stderr
    pub fn error(&self) -> Value {
        let line = self
            .stderr
            .lines()
            .rev()
            .find(|l| l.starts_with('{'))
            .unwrap_or_else(|| panic!("no error envelope in stderr: {}", self.stderr));
        serde_json::from_str(line).unwrap()
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout.as_str(), expected);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}\nstdout: {}",
            self.stdout
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}\nstderr: {}",
            self.stderr
        );
        self
    }
}
