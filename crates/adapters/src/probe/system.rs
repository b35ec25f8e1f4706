// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Probe backed by the host system

use super::{EnvProbe, ProbeError};
use async_trait::async_trait;
use tokio::process::Command;
use wrkr_core::envfp::UNAVAILABLE;
use wrkr_core::Rule;

/// Reads rule values from the host: constants, env vars and tool versions
#[derive(Clone, Debug, Default)]
pub struct SystemEnvProbe;

impl SystemEnvProbe {
    pub fn new() -> Self {
        Self
    }
}

/// First line of `<program> <args>` output, or `unavailable`
async fn version_of(program: &str, args: &[&str]) -> String {
    let output = match Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
    {
        Ok(output) if output.status.success() => output,
        _ => return UNAVAILABLE.to_string(),
    };
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    String::from_utf8_lossy(&text)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| UNAVAILABLE.to_string())
}

async fn hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    if let Ok(name) = tokio::fs::read_to_string("/proc/sys/kernel/hostname").await {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    version_of("hostname", &[]).await
}

#[async_trait]
impl EnvProbe for SystemEnvProbe {
    async fn resolve(&self, rule: &Rule) -> Result<String, ProbeError> {
        let value = match rule {
            Rule::Os => std::env::consts::OS.to_string(),
            Rule::Arch => std::env::consts::ARCH.to_string(),
            Rule::Hostname => hostname().await,
            Rule::Cwd => std::env::current_dir()
                .map_err(|e| ProbeError::Failed {
                    rule: rule.name(),
                    message: e.to_string(),
                })?
                .display()
                .to_string(),
            Rule::Env(var) => std::env::var(var).unwrap_or_default(),
            Rule::RustVersion => version_of("rustc", &["--version"]).await,
            Rule::GoVersion => version_of("go", &["version"]).await,
            Rule::Tool(bin) => version_of(bin, &["--version"]).await,
        };
        Ok(value)
    }
}
