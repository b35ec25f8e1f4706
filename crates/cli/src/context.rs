// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolved configuration and engine wiring shared by all commands

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wrkr_adapters::{ShellCommandRunner, SystemEnvProbe, TracedCommandRunner, TracedEnvProbe};
use wrkr_core::config::CONFIG_FILE_NAME;
use wrkr_core::{SystemClock, UuidIdGen, WrkrConfig};
use wrkr_engine::{Engine, EngineConfig, EngineDeps};
use wrkr_storage::JobStore;

/// Engine with concrete adapters (wrapped with tracing)
pub type CliEngine = Engine<
    TracedCommandRunner<ShellCommandRunner>,
    TracedEnvProbe<SystemEnvProbe>,
    SystemClock,
    UuidIdGen,
>;

/// Flags accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Job store directory (default: $WRKR_STORE_ROOT or ~/.wrkr)
    #[arg(long, global = true)]
    pub store_root: Option<PathBuf>,

    /// Configuration file (default: $WRKR_CONFIG or <store-root>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

pub struct Context {
    pub json: bool,
    pub store_root: PathBuf,
    pub config: WrkrConfig,
}

impl Context {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        Self::load_with(global, |key| std::env::var(key).ok())
    }

    /// Layer defaults, the config file, `WRKR_*` variables and flags
    pub fn load_with<F>(global: &GlobalArgs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_root = store_root(global.store_root.as_deref(), &lookup)?;
        let (path, required) = match (&global.config, lookup("WRKR_CONFIG")) {
            (Some(path), _) => (path.clone(), true),
            (None, Some(path)) if !path.is_empty() => (PathBuf::from(path), true),
            _ => (store_root.join(CONFIG_FILE_NAME), false),
        };
        let mut config = WrkrConfig::load(&path, required)?;
        config.apply_env(&lookup)?;
        Ok(Self {
            json: global.json,
            store_root,
            config,
        })
    }

    pub fn open_store(&self) -> Result<Arc<JobStore>> {
        Ok(Arc::new(JobStore::open(&self.store_root)?))
    }

    pub fn engine(&self) -> Result<CliEngine> {
        let settings = &self.config.engine;
        Ok(Engine::new(
            self.open_store()?,
            EngineDeps {
                runner: self.runner(),
                probe: self.probe(),
            },
            SystemClock,
            UuidIdGen,
            EngineConfig {
                coalescing: settings.progress_coalescing,
                producer_version: settings.producer_version.clone(),
            },
        ))
    }

    pub fn runner(&self) -> TracedCommandRunner<ShellCommandRunner> {
        TracedCommandRunner::new(ShellCommandRunner::new())
    }

    pub fn probe(&self) -> TracedEnvProbe<SystemEnvProbe> {
        TracedEnvProbe::new(SystemEnvProbe::new())
    }
}

fn store_root<F>(flag: Option<&Path>, lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = lookup("WRKR_STORE_ROOT").filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("cannot locate a home directory; pass --store-root"))?;
    Ok(home.join(".wrkr"))
}

/// `--approved-by`, else `WRKR_APPROVED_BY`, else `USER`, else `unknown`
pub fn approver<F>(flag: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    flag.map(str::to_string)
        .or_else(|| lookup("WRKR_APPROVED_BY"))
        .or_else(|| lookup("USER"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
