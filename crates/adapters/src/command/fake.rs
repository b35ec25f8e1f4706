// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake command runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CommandError, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Recorded command call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    pub cwd: PathBuf,
    pub command: String,
}

/// Scripted behavior for one command string
#[derive(Debug, Clone, Default)]
struct Script {
    /// Exit codes consumed one per call; afterwards `fallback`
    exit_codes: VecDeque<i32>,
    fallback: i32,
    stdout: String,
    stderr: String,
    /// Files written relative to cwd on successful runs
    writes: Vec<(String, String)>,
}

/// Fake command runner. Unscripted commands succeed with empty output.
#[derive(Clone, Default)]
pub struct FakeCommandRunner {
    calls: Arc<Mutex<Vec<CommandCall>>>,
    scripts: Arc<Mutex<HashMap<String, Script>>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn script<F: FnOnce(&mut Script)>(&self, command: &str, f: F) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        f(scripts.entry(command.to_string()).or_default());
    }

    /// Fail the first `times` runs of `command` with `exit_code`, then succeed
    pub fn fail_times(&self, command: &str, times: usize, exit_code: i32) {
        self.script(command, |s| {
            s.exit_codes.extend(std::iter::repeat(exit_code).take(times));
        });
    }

    /// Fail every run of `command`
    pub fn always_fail(&self, command: &str, exit_code: i32) {
        self.script(command, |s| s.fallback = exit_code);
    }

    /// Set captured output for `command`
    pub fn set_output(&self, command: &str, stdout: &str, stderr: &str) {
        self.script(command, |s| {
            s.stdout = stdout.to_string();
            s.stderr = stderr.to_string();
        });
    }

    /// Write `contents` to `path` (relative to cwd) whenever `command` succeeds
    pub fn writes_file(&self, command: &str, path: &str, contents: &str) {
        self.script(command, |s| {
            s.writes.push((path.to_string(), contents.to_string()));
        });
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CommandCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Commands in call order
    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(&self, cwd: &Path, command: &str) -> Result<CommandOutput, CommandError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(CommandCall {
                cwd: cwd.to_path_buf(),
                command: command.to_string(),
            });

        let (exit_code, stdout, stderr, writes) = {
            let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
            match scripts.get_mut(command) {
                Some(script) => (
                    script.exit_codes.pop_front().unwrap_or(script.fallback),
                    script.stdout.clone(),
                    script.stderr.clone(),
                    script.writes.clone(),
                ),
                None => (0, String::new(), String::new(), Vec::new()),
            }
        };

        if exit_code == 0 {
            for (path, contents) in writes {
                let target = cwd.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| CommandError::SpawnFailed(e.to_string()))?;
                }
                std::fs::write(&target, contents)
                    .map_err(|e| CommandError::SpawnFailed(e.to_string()))?;
            }
        }

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
