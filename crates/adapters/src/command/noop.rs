// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op command runner

use super::{CommandError, CommandOutput, CommandRunner};
use async_trait::async_trait;
use std::path::Path;

/// Command runner that succeeds without running anything.
///
/// Used for dry runs where only the checkpoint trail matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCommandRunner;

impl NoOpCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for NoOpCommandRunner {
    async fn run(&self, _cwd: &Path, _command: &str) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput::default())
    }
}
