// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command runner

use super::{CommandError, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Runs commands through `sh -c`
#[derive(Clone, Debug, Default)]
pub struct ShellCommandRunner;

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, cwd: &Path, command: &str) -> Result<CommandOutput, CommandError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(std::process::Stdio::null())
            .output()
            .await
            .map_err(|e| CommandError::SpawnFailed(e.to_string()))?;

        Ok(CommandOutput {
            // Killed by a signal: no exit code
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
