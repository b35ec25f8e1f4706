// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake environment probe for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{EnvProbe, ProbeError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wrkr_core::Rule;

/// Fake probe. Unset rules resolve to `fake-<rule>`.
#[derive(Clone, Default)]
pub struct FakeEnvProbe {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeEnvProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value returned for a rule name such as `os` or `env:CI`
    pub fn set(&self, rule: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(rule.to_string(), value.to_string());
    }

    /// Make resolving `rule` fail
    pub fn fail(&self, rule: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(rule.to_string());
    }

    /// Rule names resolved, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EnvProbe for FakeEnvProbe {
    async fn resolve(&self, rule: &Rule) -> Result<String, ProbeError> {
        let name = rule.name();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(name.clone());
        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&name)
        {
            return Err(ProbeError::Failed {
                rule: name,
                message: "injected failure".to_string(),
            });
        }
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values
            .get(&name)
            .cloned()
            .unwrap_or_else(|| format!("fake-{name}")))
    }
}
