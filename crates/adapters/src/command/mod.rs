// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step command execution

mod noop;
mod shell;

pub use noop::NoOpCommandRunner;
pub use shell::ShellCommandRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CommandCall, FakeCommandRunner};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from dispatching a command (not from the command exiting non-zero)
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("working directory does not exist: {0}")]
    WorkdirMissing(PathBuf),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
}

/// Captured result of one command run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr);
        }
        text
    }
}

/// Capability to run a step or check command in a working directory.
///
/// Runners never enforce timeouts; the engine bounds work through budgets.
#[async_trait]
pub trait CommandRunner: Clone + Send + Sync + 'static {
    async fn run(&self, cwd: &Path, command: &str) -> Result<CommandOutput, CommandError>;
}
