// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::probe::{EnvProbe, ProbeError};
use async_trait::async_trait;
use std::path::Path;
use wrkr_core::Rule;

/// Wrapper that adds tracing to any CommandRunner
#[derive(Clone)]
pub struct TracedCommandRunner<R> {
    inner: R,
}

impl<R> TracedCommandRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: CommandRunner> CommandRunner for TracedCommandRunner<R> {
    async fn run(&self, cwd: &Path, command: &str) -> Result<CommandOutput, CommandError> {
        let span = tracing::info_span!("command.run", cwd = %cwd.display());
        let _guard = span.enter();

        tracing::info!(command, "starting");

        // Precondition: cwd must exist
        if !cwd.is_dir() {
            tracing::error!("working directory does not exist");
            return Err(CommandError::WorkdirMissing(cwd.to_path_buf()));
        }

        let start = std::time::Instant::now();
        let result = self.inner.run(cwd, command).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(output) if output.success() => tracing::info!(
                exit_code = output.exit_code,
                elapsed_ms = elapsed.as_millis() as u64,
                "command finished"
            ),
            Ok(output) => tracing::warn!(
                exit_code = output.exit_code,
                elapsed_ms = elapsed.as_millis() as u64,
                stderr_len = output.stderr.len(),
                "command exited non-zero"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "dispatch failed"
            ),
        }

        result
    }
}

/// Wrapper that adds tracing to any EnvProbe
#[derive(Clone)]
pub struct TracedEnvProbe<P> {
    inner: P,
}

impl<P> TracedEnvProbe<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: EnvProbe> EnvProbe for TracedEnvProbe<P> {
    async fn resolve(&self, rule: &Rule) -> Result<String, ProbeError> {
        let result = self.inner.resolve(rule).await;
        match &result {
            Ok(value) => tracing::debug!(rule = %rule, value, "resolved"),
            Err(e) => tracing::warn!(rule = %rule, error = %e, "probe failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
