// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration
//!
//! Layers, lowest first: built-in defaults, `config.toml`, `WRKR_*`
//! environment variables. CLI flags are applied last by the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9488";
pub const DEFAULT_SERVE_WORKERS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// How progress checkpoints are coalesced under `min_interval_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressCoalescing {
    /// One progress per finished step; only retry progress is rate limited
    #[default]
    StepBoundary,
    /// Every progress is rate limited except the one before the terminal checkpoint
    Interval,
}

impl std::str::FromStr for ProgressCoalescing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "step-boundary" => Ok(ProgressCoalescing::StepBoundary),
            "interval" => Ok(ProgressCoalescing::Interval),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub progress_coalescing: ProgressCoalescing,
    pub producer_version: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            progress_coalescing: ProgressCoalescing::default(),
            producer_version: crate::PRODUCER_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeSettings {
    pub listen: String,
    pub workers: usize,
    pub allow_non_loopback: bool,
    pub auth_token: Option<String>,
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            workers: DEFAULT_SERVE_WORKERS,
            allow_non_loopback: false,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcceptSettings {
    /// Explicitly configured accept policy path
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WrkrConfig {
    pub engine: EngineSettings,
    pub serve: ServeSettings,
    pub accept: AcceptSettings,
}

impl WrkrConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`. A missing file is the default unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(WrkrConfig::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Overlay `WRKR_*` variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("WRKR_PROGRESS_COALESCING") {
            self.engine.progress_coalescing =
                value.parse().map_err(|value| ConfigError::InvalidValue {
                    key: "WRKR_PROGRESS_COALESCING".to_string(),
                    value,
                })?;
        }
        if let Some(value) = lookup("WRKR_SERVE_LISTEN") {
            self.serve.listen = value;
        }
        if let Some(value) = lookup("WRKR_SERVE_WORKERS") {
            self.serve.workers = value
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "WRKR_SERVE_WORKERS".to_string(),
                    value,
                })?;
        }
        if let Some(value) = lookup("WRKR_SERVE_AUTH_TOKEN").filter(|v| !v.is_empty()) {
            self.serve.auth_token = Some(value);
        }
        if let Some(value) = lookup("WRKR_ACCEPT_CONFIG").filter(|v| !v.is_empty()) {
            self.accept.config_path = Some(PathBuf::from(value));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
