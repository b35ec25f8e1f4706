// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment probes for reproducibility fingerprints

mod system;

pub use system::SystemEnvProbe;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEnvProbe;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use wrkr_core::{EnvFingerprint, Rule};

/// Errors from resolving a rule
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unknown fingerprint rule: {0}")]
    UnknownRule(String),
    #[error("probe {rule} failed: {message}")]
    Failed { rule: String, message: String },
}

/// Resolves fingerprint rules to values from the running environment
#[async_trait]
pub trait EnvProbe: Clone + Send + Sync + 'static {
    async fn resolve(&self, rule: &Rule) -> Result<String, ProbeError>;
}

/// Resolve every rule in `rules` (already normalized) and digest the values
pub async fn capture<P: EnvProbe>(probe: &P, rules: &[String]) -> Result<EnvFingerprint, ProbeError> {
    let mut values = BTreeMap::new();
    for name in rules {
        let rule = Rule::parse(name).ok_or_else(|| ProbeError::UnknownRule(name.clone()))?;
        let value = probe.resolve(&rule).await?;
        values.insert(name.clone(), value.trim().to_string());
    }
    Ok(EnvFingerprint::from_values(rules.to_vec(), values))
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
