// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance policy document

use crate::jobspec::{check_relative_path, parse_document, DocumentFormat, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ACCEPT_CONFIG_SCHEMA_ID: &str = "wrkr.accept_config";
pub const DEFAULT_ACCEPT_CONFIG_PATH: &str = "accept.yaml";

/// Post-run acceptance checks, independent of any job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptConfig {
    #[serde(default)]
    pub schema_id: String,
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub required_artifacts: Vec<String>,
    #[serde(default)]
    pub test_command: String,
    #[serde(default)]
    pub lint_command: String,
    #[serde(default)]
    pub path_rules: PathRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathRules {
    /// Zero means unlimited
    #[serde(default)]
    pub max_artifact_paths: usize,
    #[serde(default)]
    pub forbidden_prefixes: Vec<String>,
    #[serde(default)]
    pub allowed_prefixes: Vec<String>,
}

impl Default for AcceptConfig {
    fn default() -> Self {
        Self {
            schema_id: ACCEPT_CONFIG_SCHEMA_ID.to_string(),
            schema_version: crate::SCHEMA_VERSION.to_string(),
            required_artifacts: Vec::new(),
            test_command: String::new(),
            lint_command: String::new(),
            path_rules: PathRules::default(),
        }
    }
}

impl AcceptConfig {
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ValidationError> {
        let config: AcceptConfig = parse_document(content, format)?;
        config.normalize()
    }

    /// Load from `path`. When `required` is false a missing file yields the default.
    pub fn load(path: &Path, required: bool) -> Result<Self, ValidationError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, DocumentFormat::from_path(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(AcceptConfig::default())
            }
            Err(e) => Err(ValidationError::new(
                "document",
                format!("cannot read {}: {e}", path.display()),
            )),
        }
    }

    fn normalize(mut self) -> Result<Self, ValidationError> {
        self.schema_id = self.schema_id.trim().to_string();
        if self.schema_id.is_empty() {
            self.schema_id = ACCEPT_CONFIG_SCHEMA_ID.to_string();
        }
        if self.schema_id != ACCEPT_CONFIG_SCHEMA_ID {
            return Err(ValidationError::new(
                "schema_id",
                format!("expected {ACCEPT_CONFIG_SCHEMA_ID:?}, got {:?}", self.schema_id),
            ));
        }
        self.schema_version = self.schema_version.trim().to_string();
        if self.schema_version.is_empty() {
            self.schema_version = crate::SCHEMA_VERSION.to_string();
        }
        if self.schema_version != crate::SCHEMA_VERSION {
            return Err(ValidationError::new(
                "schema_version",
                format!("unsupported version {:?}", self.schema_version),
            ));
        }
        self.required_artifacts = normalized_list(&self.required_artifacts);
        self.test_command = self.test_command.trim().to_string();
        self.lint_command = self.lint_command.trim().to_string();
        self.path_rules.forbidden_prefixes = normalized_list(&self.path_rules.forbidden_prefixes);
        self.path_rules.allowed_prefixes = normalized_list(&self.path_rules.allowed_prefixes);
        check_paths("required_artifacts", &self.required_artifacts)?;
        check_paths("path_rules.forbidden_prefixes", &self.path_rules.forbidden_prefixes)?;
        check_paths("path_rules.allowed_prefixes", &self.path_rules.allowed_prefixes)?;
        Ok(self)
    }
}

/// Every entry must stay under the artifact root
fn check_paths(field: &str, paths: &[String]) -> Result<(), ValidationError> {
    for (i, path) in paths.iter().enumerate() {
        check_relative_path(path).map_err(|msg| ValidationError::new(format!("{field}[{i}]"), msg))?;
    }
    Ok(())
}

/// Trim, drop empties, dedupe and sort
fn normalized_list(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
#[path = "accept_tests.rs"]
mod tests;
